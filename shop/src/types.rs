//! Shared data model for the shop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A purchasable item.
///
/// Never mutated once loaded. A catalog may be replaced wholesale (for
/// example when generated images arrive), but ids and prices stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique id
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price in dollars, never negative
    pub price: f64,
    /// Short description
    pub description: String,
    /// Aisle the item belongs to
    pub category: String,
    /// Image reference: a static path or a `data:` URI
    pub image_ref: String,
}

/// One catalog item plus its quantity in the cart.
///
/// `quantity` is always at least 1 while the line lives in a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the item at the time it was first added
    pub item: CatalogItem,
    /// Units of the item
    pub quantity: u32,
}

impl CartLine {
    /// `price × quantity` for this line
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

/// The identified shopper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Email-like identity, as typed at login
    pub email: String,
}

/// Which page is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Page {
    /// Login form
    #[default]
    Login,
    /// Product listing with the cart
    Catalog,
    /// Order review and confirmation
    Checkout,
}

/// A shopping tip from the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Short, catchy headline
    pub title: String,
    /// One or two sentences of advice
    pub suggestion: String,
}

/// Render a dollar amount with two decimals, e.g. `$11.97`
#[must_use]
pub fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}
