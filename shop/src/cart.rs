//! Cart Ledger
//!
//! An ordered collection of [`CartLine`]s, one per item id. The first item
//! added stays first; quantity updates never reorder lines. Totals are
//! recomputed from the lines on every read.

use crate::types::{CartLine, CatalogItem, ProductId};
use cartflow_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};

/// The cart contents for the current session.
///
/// Invariants:
/// - at most one line per item id
/// - every line has `quantity >= 1`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartLedger {
    lines: Vec<CartLine>,
}

impl CartLedger {
    /// An empty ledger
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of `item`.
    ///
    /// Increments the existing line for `item.id`, or appends a new line with
    /// quantity 1. The item is taken verbatim; catalog membership is the
    /// caller's concern.
    pub fn add_item(&mut self, item: CatalogItem) {
        match self.lines.iter_mut().find(|line| line.item.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine { item, quantity: 1 }),
        }
    }

    /// Remove the line for `id`. Absent ids are a no-op.
    pub fn remove_item(&mut self, id: &ProductId) {
        self.lines.retain(|line| &line.item.id != id);
    }

    /// Replace the quantity of the line for `id`.
    ///
    /// The requested value is clamped with `max(0, quantity)`; zero removes
    /// the line. Absent ids are a no-op.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) {
        let clamped = quantity.max(0);

        if clamped == 0 {
            self.remove_item(id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| &line.item.id == id) {
            line.quantity = u32::try_from(clamped).unwrap_or(u32::MAX);
        }
    }

    /// `Σ price × quantity` over all lines
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// `Σ quantity` over all lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Lines in insertion order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if any
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.item.id == id)
    }

    /// Number of distinct lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the ledger has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Mutations of the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Add one unit of an item
    AddItem {
        /// Item snapshot to add
        item: CatalogItem,
    },
    /// Remove an item's line entirely
    RemoveItem {
        /// Item to remove
        id: ProductId,
    },
    /// Set an item's quantity (clamped at zero)
    SetQuantity {
        /// Item to update
        id: ProductId,
        /// Requested quantity, possibly negative
        quantity: i64,
    },
    /// Empty the ledger
    Clear,
}

impl CartAction {
    /// Short operation name, used as a metrics label
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "add",
            Self::RemoveItem { .. } => "remove",
            Self::SetQuantity { .. } => "set_quantity",
            Self::Clear => "clear",
        }
    }
}

/// Applies [`CartAction`]s to a [`CartLedger`]. Never produces effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartReducer;

impl Reducer for CartReducer {
    type State = CartLedger;
    type Action = CartAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::AddItem { item } => state.add_item(item),
            CartAction::RemoveItem { id } => state.remove_item(&id),
            CartAction::SetQuantity { id, quantity } => state.set_quantity(&id, quantity),
            CartAction::Clear => state.clear(),
        }

        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use cartflow_testing::{ReducerTest, assertions};

    fn product(id: &str) -> CatalogItem {
        Catalog::baseline()
            .get(&ProductId::new(id))
            .cloned()
            .unwrap_or_else(|| CatalogItem {
                id: ProductId::new(id),
                name: format!("Item {id}"),
                price: 1.0,
                description: String::new(),
                category: String::new(),
                image_ref: String::new(),
            })
    }

    #[test]
    fn test_add_merges_same_id() {
        let mut cart = CartLedger::new();
        cart.add_item(product("1"));
        cart.add_item(product("1"));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductId::new("1")).map(|l| l.quantity), Some(2));
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let mut cart = CartLedger::new();
        cart.add_item(product("3"));
        cart.add_item(product("1"));
        cart.add_item(product("3"));
        cart.set_quantity(&ProductId::new("1"), 5);

        let ids: Vec<_> = cart.lines().iter().map(|l| l.item.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = CartLedger::new();
        cart.add_item(product("2"));
        let before = cart.clone();

        cart.remove_item(&ProductId::new("8"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_clamps_negative_to_removal() {
        let mut cart = CartLedger::new();
        cart.add_item(product("4"));

        cart.set_quantity(&ProductId::new("4"), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_on_absent_id_is_noop() {
        let mut cart = CartLedger::new();
        cart.add_item(product("4"));

        cart.set_quantity(&ProductId::new("5"), 10);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_total_and_count() {
        let mut cart = CartLedger::new();
        cart.add_item(product("1"));
        cart.add_item(product("1"));
        cart.add_item(product("1"));
        cart.add_item(product("2"));

        assert!((cart.total() - (3.99 * 3.0 + 2.49)).abs() < 1e-9);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_reducer_applies_set_quantity() {
        let mut given = CartLedger::new();
        given.add_item(product("6"));

        ReducerTest::new(CartReducer)
            .with_env(())
            .given_state(given)
            .when_action(CartAction::SetQuantity {
                id: ProductId::new("6"),
                quantity: 4,
            })
            .then_state(|cart| {
                assert_eq!(cart.item_count(), 4);
                assert!((cart.total() - 8.99 * 4.0).abs() < 1e-9);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_clear() {
        let mut given = CartLedger::new();
        given.add_item(product("7"));
        given.add_item(product("8"));

        ReducerTest::new(CartReducer)
            .with_env(())
            .given_state(given)
            .when_action(CartAction::Clear)
            .then_state(|cart| {
                assert!(cart.is_empty());
                assert_eq!(cart.item_count(), 0);
            })
            .run();
    }
}
