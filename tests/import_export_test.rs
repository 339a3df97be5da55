mod common;

use std::io::Cursor;

use anyhow::Result;
use common::{StoreItems, parse_date, store_example_day, test_service};
use fidelis::domain::LogEntry;
use fidelis::io::{Exporter, Importer, StoreSnapshot, read_catalog_csv};

#[tokio::test]
async fn test_csv_day_log_through_service() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let catalog = read_catalog_csv(Cursor::new(StoreItems::CATALOG_CSV))?;

    let log = "customer_id,points_redeemed,items\n\
               c1,100,banana;banana;apple\n\
               c2,0,banana;apple\n\
               c1,0,banana\n\
               c3,7,\n\
               c4,1,kiwi\n";

    let imported = Importer::new(&catalog).import_log_csv(Cursor::new(log))?;
    assert_eq!(imported.entries.len(), 4);
    assert_eq!(imported.errors.len(), 1);
    assert_eq!(imported.errors[0].record, 6);

    let report = service
        .process_day(parse_date("2024-03-01"), &imported.entries, false)
        .await?;

    // c3 had no item list: error log, not an import error
    assert_eq!(report.run.entries_rejected, 1);
    assert_eq!(report.rejected[0].customer_id.as_deref(), Some("c3"));

    assert_eq!(service.point_balance("c1").await?, 13);
    assert_eq!(service.point_balance("c2").await?, 8);
    assert_eq!(service.point_balance("c4").await?, 0);
    assert_eq!(service.item_sale_count("banana").await?, 3);

    Ok(())
}

#[tokio::test]
async fn test_json_day_log_through_service() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let catalog = read_catalog_csv(Cursor::new(StoreItems::CATALOG_CSV))?;

    let log = r#"[
        {"customer_id": "c1", "points_redeemed": 100,
         "purchased_items": ["banana", "banana", {"id": "apple", "unit_price": "100.00"}]},
        {"customer_id": "c2", "points_redeemed": null, "purchased_items": ["banana", "apple"]},
        {"customer_id": "c1", "purchased_items": ["banana"]},
        {"points_redeemed": 3, "purchased_items": ["apple"]}
    ]"#;

    let imported = Importer::new(&catalog).import_log_json(Cursor::new(log))?;
    assert!(imported.errors.is_empty());

    service
        .process_day(parse_date("2024-03-01"), &imported.entries, false)
        .await?;

    assert_eq!(service.point_balance("c1").await?, 13);
    assert_eq!(service.point_balance("c2").await?, 8);
    assert_eq!(service.item_sale_count("apple").await?, 3);

    Ok(())
}

#[tokio::test]
async fn test_export_balances_and_items_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .process_day(parse_date("2024-03-01"), &store_example_day(), false)
        .await?;

    let exporter = Exporter::new(&service);

    let mut balances = Vec::new();
    let count = exporter.export_balances_csv(&mut balances).await?;
    assert_eq!(count, 2);
    assert_eq!(
        String::from_utf8(balances)?,
        "customer_id,balance\nc1,13\nc2,8\n"
    );

    let mut items = Vec::new();
    exporter.export_items_csv(&mut items).await?;
    assert_eq!(
        String::from_utf8(items)?,
        "item_id,units_sold\napple,2\nbanana,3\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_exported_error_log_can_be_reimported() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let malformed = LogEntry::default()
        .with_customer("c9")
        .with_points_redeemed(4);
    service
        .process_day(parse_date("2024-03-01"), &[malformed.clone()], false)
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_errors_json(&mut buffer)
        .await?;
    assert_eq!(count, 1);

    let catalog = read_catalog_csv(Cursor::new(StoreItems::CATALOG_CSV))?;
    let reimported = Importer::new(&catalog).import_log_json(Cursor::new(buffer))?;
    assert_eq!(reimported.entries, vec![malformed]);

    Ok(())
}

#[tokio::test]
async fn test_export_full_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut entries = store_example_day();
    entries.push(LogEntry::default());
    service
        .process_day(parse_date("2024-03-01"), &entries, false)
        .await?;

    let mut buffer = Vec::new();
    let snapshot = Exporter::new(&service).export_full_json(&mut buffer).await?;
    assert_eq!(snapshot.point_balances.len(), 2);
    assert_eq!(snapshot.item_sales.len(), 2);
    assert_eq!(snapshot.error_log.len(), 1);
    assert_eq!(snapshot.days.len(), 1);

    let parsed: StoreSnapshot = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed.policy, snapshot.policy);
    assert_eq!(parsed.days[0].business_date, parse_date("2024-03-01"));

    Ok(())
}

#[tokio::test]
async fn test_huge_imported_prices_do_not_overflow() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let catalog = read_catalog_csv(Cursor::new(StoreItems::CATALOG_CSV))?;

    let log = r#"[
        {"customer_id": "c1", "purchased_items": [
            {"id": "yacht", "unit_price": 5000000000000000000},
            {"id": "yacht", "unit_price": 5000000000000000000}
        ]}
    ]"#;

    let imported = Importer::new(&catalog).import_log_json(Cursor::new(log))?;
    assert!(imported.errors.is_empty());

    let report = service
        .process_day(parse_date("2024-03-01"), &imported.entries, false)
        .await?;

    assert_eq!(report.customer("c1").map(|c| c.net_spend), Some(i64::MAX));
    assert_eq!(service.item_sale_count("yacht").await?, 2);
    assert_eq!(service.point_balance("c1").await?, i64::MAX / 1700);

    Ok(())
}
