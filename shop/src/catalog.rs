//! The fixed grocery catalog.

use crate::types::{CatalogItem, ProductId};
use std::collections::HashMap;

/// Baseline rows: id, name, price, image, description, category
const BASELINE: [(&str, &str, f64, &str, &str, &str); 8] = [
    (
        "1",
        "Organic Apples",
        3.99,
        "static/organicapples.jpeg",
        "Crisp and juicy organic apples, perfect for snacking.",
        "Fruits",
    ),
    (
        "2",
        "Whole Wheat Bread",
        2.49,
        "static/wholewheatbread.jpeg",
        "Freshly baked whole wheat bread, rich in fiber.",
        "Bakery",
    ),
    (
        "3",
        "Free-Range Eggs",
        4.99,
        "static/freerangeeggs.jpeg",
        "A dozen large free-range eggs from happy chickens.",
        "Dairy & Eggs",
    ),
    (
        "4",
        "Almond Milk",
        3.79,
        "static/almondmilk.jpeg",
        "Unsweetened almond milk, a great dairy alternative.",
        "Beverages",
    ),
    (
        "5",
        "Spinach Bunch",
        1.99,
        "static/spinachbunch.jpeg",
        "Fresh organic spinach, packed with nutrients.",
        "Vegetables",
    ),
    (
        "6",
        "Chicken Breast",
        8.99,
        "static/chickenbreast.jpeg",
        "Boneless, skinless chicken breast, lean and versatile.",
        "Meat & Poultry",
    ),
    (
        "7",
        "Avocado",
        1.79,
        "static/avocado.jpeg",
        "Creamy Hass avocado, great for salads and toast.",
        "Fruits",
    ),
    (
        "8",
        "Greek Yogurt",
        4.29,
        "static/greekyogurt.jpeg",
        "Plain Greek yogurt, high in protein.",
        "Dairy & Eggs",
    ),
];

/// Read-only list of purchasable items, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Build a catalog from explicit items
    #[must_use]
    pub const fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// The eight grocery products with their placeholder images
    #[must_use]
    pub fn baseline() -> Self {
        let items = BASELINE
            .iter()
            .map(
                |&(id, name, price, image_ref, description, category)| CatalogItem {
                    id: ProductId::new(id),
                    name: name.to_string(),
                    price,
                    description: description.to_string(),
                    category: category.to_string(),
                    image_ref: image_ref.to_string(),
                },
            )
            .collect();

        Self { items }
    }

    /// Look up an item by id
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// All items in display order
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copy of this catalog with image references substituted.
    ///
    /// Only ids present in `images` change; every other field is kept.
    #[must_use]
    pub fn with_images(&self, images: &HashMap<ProductId, String>) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| match images.get(&item.id) {
                Some(image_ref) => CatalogItem {
                    image_ref: image_ref.clone(),
                    ..item.clone()
                },
                None => item.clone(),
            })
            .collect();

        Self { items }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_has_eight_unique_products() {
        let catalog = Catalog::baseline();
        assert_eq!(catalog.len(), 8);

        let mut ids: Vec<_> = catalog.items().iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_get_known_products() {
        let catalog = Catalog::baseline();

        let apples = catalog.get(&ProductId::new("1"));
        assert_eq!(apples.map(|i| i.name.as_str()), Some("Organic Apples"));
        assert_eq!(apples.map(|i| i.price), Some(3.99));

        let bread = catalog.get(&ProductId::new("2"));
        assert_eq!(bread.map(|i| i.price), Some(2.49));

        assert!(catalog.get(&ProductId::new("99")).is_none());
    }

    #[test]
    fn test_with_images_replaces_only_listed_ids() {
        let baseline = Catalog::baseline();
        let images = HashMap::from([(
            ProductId::new("3"),
            "data:image/jpeg;base64,AAAA".to_string(),
        )]);

        let updated = baseline.with_images(&images);

        for (before, after) in baseline.items().iter().zip(updated.items()) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.price, after.price);
            assert_eq!(before.name, after.name);
            if before.id.as_str() == "3" {
                assert_eq!(after.image_ref, "data:image/jpeg;base64,AAAA");
            } else {
                assert_eq!(before.image_ref, after.image_ref);
            }
        }
    }
}
