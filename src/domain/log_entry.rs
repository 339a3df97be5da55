use serde::{Deserialize, Serialize};

use super::{Cents, Item};

pub type CustomerId = String;

/// Loyalty points. Balances are signed; redemptions are clamped so they never go below zero.
pub type Points = i64;

/// One purchase transaction from the store's daily log.
///
/// Any field may be absent in a malformed log. Entries are consumed once by the
/// ledger and never mutated; an entry without `purchased_items` ends up in the
/// error log verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Points the customer asked to spend on this purchase
    #[serde(default)]
    pub points_redeemed: Option<Points>,
    /// One element per unit sold; duplicates are expected
    #[serde(default)]
    pub purchased_items: Option<Vec<Item>>,
}

impl LogEntry {
    /// Entry for an anonymous purchase with no redemption.
    pub fn new(purchased_items: Vec<Item>) -> Self {
        Self {
            customer_id: None,
            points_redeemed: None,
            purchased_items: Some(purchased_items),
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<CustomerId>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_points_redeemed(mut self, points: Points) -> Self {
        self.points_redeemed = Some(points);
        self
    }

    pub fn without_items(mut self) -> Self {
        self.purchased_items = None;
        self
    }

    /// An entry with no item list cannot be accounted for.
    pub fn is_malformed(&self) -> bool {
        self.purchased_items.is_none()
    }

    /// Gross value of the purchased items, before any redemption. Saturates at
    /// `Cents::MAX` rather than wrapping.
    pub fn gross_spend(&self) -> Cents {
        self.purchased_items
            .iter()
            .flatten()
            .fold(0, |total: Cents, item| total.saturating_add(item.unit_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let entry = LogEntry::new(vec![Item::new("banana", 5000)])
            .with_customer("c1")
            .with_points_redeemed(100);

        assert_eq!(entry.customer_id.as_deref(), Some("c1"));
        assert_eq!(entry.points_redeemed, Some(100));
        assert!(!entry.is_malformed());
    }

    #[test]
    fn test_without_items_is_malformed() {
        let entry = LogEntry::default().with_customer("c1").without_items();
        assert!(entry.is_malformed());
        assert_eq!(entry.gross_spend(), 0);
    }

    #[test]
    fn test_gross_spend_counts_every_unit() {
        let entry = LogEntry::new(vec![
            Item::new("banana", 5000),
            Item::new("banana", 5000),
            Item::new("apple", 10000),
        ]);
        assert_eq!(entry.gross_spend(), 20000);
    }

    #[test]
    fn test_gross_spend_saturates() {
        let entry = LogEntry::new(vec![
            Item::new("yacht", Cents::MAX - 10),
            Item::new("yacht", Cents::MAX - 10),
        ]);
        assert_eq!(entry.gross_spend(), Cents::MAX);
    }

    #[test]
    fn test_missing_fields_deserialize_as_absent() {
        let entry: LogEntry = serde_json::from_str(r#"{"customer_id": "c2"}"#).unwrap();
        assert_eq!(entry.customer_id.as_deref(), Some("c2"));
        assert_eq!(entry.points_redeemed, None);
        assert_eq!(entry.purchased_items, None);

        let entry: LogEntry = serde_json::from_str(
            r#"{"customer_id": null, "points_redeemed": null, "purchased_items": []}"#,
        )
        .unwrap();
        assert_eq!(entry.customer_id, None);
        assert_eq!(entry.purchased_items, Some(vec![]));
    }
}
