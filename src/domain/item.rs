use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, deserialize_amount};

pub type ItemId = String;

/// A catalog item as it appears on a receipt. One `Item` in a purchase list is one unit sold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Price of a single unit in cents (never negative)
    #[serde(deserialize_with = "deserialize_amount")]
    pub unit_price: Cents,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, unit_price: Cents) -> Self {
        assert!(unit_price >= 0, "Item price must not be negative");
        Self {
            id: id.into(),
            unit_price,
        }
    }
}

/// Lookup table from item id to its catalog entry.
/// Used to resolve purchase logs that only carry item ids.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<ItemId, Item>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, returning the entry it replaced (if any).
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.items.insert(item.id.clone(), item)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Item> for Catalog {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_item() {
        let banana = Item::new("banana", 5000);
        assert_eq!(banana.id, "banana");
        assert_eq!(banana.unit_price, 5000);
    }

    #[test]
    #[should_panic(expected = "Item price must not be negative")]
    fn test_item_requires_non_negative_price() {
        Item::new("refund", -100);
    }

    #[test]
    fn test_item_deserializes_decimal_price() {
        let item: Item = serde_json::from_str(r#"{"id": "apple", "unit_price": "100.00"}"#).unwrap();
        assert_eq!(item, Item::new("apple", 10000));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog: Catalog = [Item::new("banana", 5000), Item::new("apple", 10000)]
            .into_iter()
            .collect();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("apple").map(|i| i.unit_price), Some(10000));
        assert!(catalog.get("cherry").is_none());
    }

    #[test]
    fn test_catalog_insert_replaces() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(Item::new("banana", 5000)).is_none());
        let previous = catalog.insert(Item::new("banana", 4500));
        assert_eq!(previous.map(|i| i.unit_price), Some(5000));
        assert_eq!(catalog.get("banana").map(|i| i.unit_price), Some(4500));
    }
}
