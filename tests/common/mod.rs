// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use fidelis::application::RewardsService;
use fidelis::domain::{Item, LogEntry};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(RewardsService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = RewardsService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into a NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: the two-item store catalog
pub struct StoreItems;

impl StoreItems {
    pub fn banana() -> Item {
        Item::new("banana", 5000)
    }

    pub fn apple() -> Item {
        Item::new("apple", 10000)
    }

    pub const CATALOG_CSV: &'static str = "id,price\nbanana,50.00\napple,100.00\n";
}

/// The example day: c1 buys 2 bananas + 1 apple with 100 points, c2 buys a
/// banana and an apple, c1 comes back for one more banana.
pub fn store_example_day() -> Vec<LogEntry> {
    vec![
        LogEntry::new(vec![
            StoreItems::banana(),
            StoreItems::banana(),
            StoreItems::apple(),
        ])
        .with_customer("c1")
        .with_points_redeemed(100),
        LogEntry::new(vec![StoreItems::banana(), StoreItems::apple()])
            .with_customer("c2")
            .with_points_redeemed(0),
        LogEntry::new(vec![StoreItems::banana()])
            .with_customer("c1")
            .with_points_redeemed(0),
    ]
}
