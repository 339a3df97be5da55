use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{CustomerBalance, ItemSales, RewardsService};
use crate::domain::{DayRun, LogEntry, RewardPolicy};

/// Full store snapshot for backup or hand-off to reporting tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub policy: RewardPolicy,
    pub point_balances: Vec<CustomerBalance>,
    pub item_sales: Vec<ItemSales>,
    pub error_log: Vec<LogEntry>,
    pub days: Vec<DayRun>,
}

/// Exporter for converting ledger data to CSV and JSON
pub struct Exporter<'a> {
    service: &'a RewardsService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a RewardsService) -> Self {
        Self { service }
    }

    /// Export point balances to CSV format
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.all_point_balances().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["customer_id", "balance"])?;
        for entry in &balances {
            let balance = entry.balance.to_string();
            csv_writer.write_record([entry.customer_id.as_str(), balance.as_str()])?;
        }

        csv_writer.flush()?;
        Ok(balances.len())
    }

    /// Export cumulative item sale counts to CSV format
    pub async fn export_items_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let items = self.service.all_item_sale_counts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["item_id", "units_sold"])?;
        for entry in &items {
            let units_sold = entry.units_sold.to_string();
            csv_writer.write_record([entry.item_id.as_str(), units_sold.as_str()])?;
        }

        csv_writer.flush()?;
        Ok(items.len())
    }

    /// Export the error log as a JSON array, in the same shape the JSON importer reads
    pub async fn export_errors_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let error_log = self.service.error_log().await?;
        serde_json::to_writer_pretty(&mut writer, &error_log)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(error_log.len())
    }

    /// Export the full store as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<StoreSnapshot> {
        let snapshot = StoreSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            policy: *self.service.policy(),
            point_balances: self.service.all_point_balances().await?,
            item_sales: self.service.all_item_sale_counts().await?,
            error_log: self.service.error_log().await?,
            days: self.service.list_days().await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
