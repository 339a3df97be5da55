use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{CustomerDay, CustomerId, DayRun, DayRunId, ItemId, LogEntry, Points};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything a processed day writes, committed in a single transaction.
pub struct DayRecord<'a> {
    pub run: &'a DayRun,
    pub customers: &'a [CustomerDay],
    /// Full balance map after the day; only customers active that day are written
    pub point_balances: &'a HashMap<CustomerId, Points>,
    pub item_sale_counts: &'a HashMap<ItemId, u64>,
    /// Entries routed to the error log during this day
    pub rejected: &'a [LogEntry],
}

/// Repository for persisting ledger state and processed days.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Ledger state
    // ========================

    /// All point balances, ordered by customer id.
    pub async fn list_point_balances(&self) -> Result<Vec<(CustomerId, Points)>> {
        let rows = sqlx::query("SELECT customer_id, balance FROM point_balances ORDER BY customer_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list point balances")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("customer_id"), row.get("balance")))
            .collect())
    }

    pub async fn load_point_balances(&self) -> Result<HashMap<CustomerId, Points>> {
        Ok(self.list_point_balances().await?.into_iter().collect())
    }

    pub async fn get_point_balance(&self, customer_id: &str) -> Result<Option<Points>> {
        let row = sqlx::query("SELECT balance FROM point_balances WHERE customer_id = ?")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch point balance")?;

        Ok(row.map(|row| row.get("balance")))
    }

    /// All item sale counts, ordered by item id.
    pub async fn list_item_sale_counts(&self) -> Result<Vec<(ItemId, u64)>> {
        let rows = sqlx::query("SELECT item_id, units_sold FROM item_sales ORDER BY item_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list item sale counts")?;

        rows.iter()
            .map(|row| -> Result<(ItemId, u64)> {
                Ok((row.get("item_id"), Self::units_sold(row)?))
            })
            .collect()
    }

    pub async fn load_item_sale_counts(&self) -> Result<HashMap<ItemId, u64>> {
        Ok(self.list_item_sale_counts().await?.into_iter().collect())
    }

    pub async fn get_item_sale_count(&self, item_id: &str) -> Result<Option<u64>> {
        let row = sqlx::query("SELECT units_sold FROM item_sales WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch item sale count")?;

        row.as_ref().map(Self::units_sold).transpose()
    }

    /// The error log in the order entries were rejected.
    pub async fn load_error_log(&self) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query("SELECT entry FROM error_log ORDER BY sequence")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load error log")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    fn units_sold(row: &sqlx::sqlite::SqliteRow) -> Result<u64> {
        let units: i64 = row.get("units_sold");
        u64::try_from(units).context("Negative units_sold in item_sales")
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<LogEntry> {
        let json: String = row.get("entry");
        serde_json::from_str(&json).context("Invalid error log entry")
    }

    // ========================
    // Day runs
    // ========================

    /// Persist a processed day: run record, customer rows, balances, item counts
    /// and rejected entries. Either everything is written or nothing is.
    pub async fn save_day(&self, record: DayRecord<'_>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let run_id = record.run.id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        sqlx::query(
            r#"
            INSERT INTO day_runs (id, business_date, processed_at, entries_processed, entries_rejected, total_redeemed, total_awarded)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run_id)
        .bind(record.run.business_date.format(DATE_FORMAT).to_string())
        .bind(record.run.processed_at.to_rfc3339())
        .bind(record.run.entries_processed)
        .bind(record.run.entries_rejected)
        .bind(record.run.total_redeemed)
        .bind(record.run.total_awarded)
        .execute(&mut *tx)
        .await
        .context("Failed to save day run")?;

        for customer in record.customers {
            sqlx::query(
                r#"
                INSERT INTO customer_days (day_run_id, customer_id, net_spend_cents, points_redeemed, points_awarded)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&run_id)
            .bind(&customer.customer_id)
            .bind(customer.net_spend)
            .bind(customer.points_redeemed)
            .bind(customer.points_awarded)
            .execute(&mut *tx)
            .await
            .context("Failed to save customer day")?;

            let balance = record
                .point_balances
                .get(&customer.customer_id)
                .copied()
                .unwrap_or(0);

            sqlx::query(
                r#"
                INSERT INTO point_balances (customer_id, balance, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(customer_id) DO UPDATE SET balance = excluded.balance, updated_at = excluded.updated_at
                "#,
            )
            .bind(&customer.customer_id)
            .bind(balance)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to save point balance")?;
        }

        for (item_id, units_sold) in record.item_sale_counts {
            let units_sold = i64::try_from(*units_sold).context("Item sale count out of range")?;
            sqlx::query(
                r#"
                INSERT INTO item_sales (item_id, units_sold, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(item_id) DO UPDATE SET units_sold = excluded.units_sold, updated_at = excluded.updated_at
                "#,
            )
            .bind(item_id)
            .bind(units_sold)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to save item sale count")?;
        }

        for entry in record.rejected {
            let json = serde_json::to_string(entry)?;
            sqlx::query("INSERT INTO error_log (day_run_id, entry, recorded_at) VALUES (?, ?, ?)")
                .bind(&run_id)
                .bind(&json)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .context("Failed to save error log entry")?;
        }

        tx.commit().await.context("Failed to commit day")?;
        Ok(())
    }

    /// All day runs, oldest business date first.
    pub async fn list_day_runs(&self) -> Result<Vec<DayRun>> {
        let rows = sqlx::query(
            r#"
            SELECT id, business_date, processed_at, entries_processed, entries_rejected, total_redeemed, total_awarded
            FROM day_runs
            ORDER BY business_date, processed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list day runs")?;

        rows.iter().map(Self::row_to_day_run).collect()
    }

    /// Day runs for one business date (more than one if the day was forced through again).
    pub async fn find_day_runs(&self, business_date: NaiveDate) -> Result<Vec<DayRun>> {
        let rows = sqlx::query(
            r#"
            SELECT id, business_date, processed_at, entries_processed, entries_rejected, total_redeemed, total_awarded
            FROM day_runs
            WHERE business_date = ?
            ORDER BY processed_at
            "#,
        )
        .bind(business_date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch day runs")?;

        rows.iter().map(Self::row_to_day_run).collect()
    }

    pub async fn list_customer_days(&self, run_id: DayRunId) -> Result<Vec<CustomerDay>> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, net_spend_cents, points_redeemed, points_awarded
            FROM customer_days
            WHERE day_run_id = ?
            ORDER BY customer_id
            "#,
        )
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customer days")?;

        Ok(rows
            .iter()
            .map(|row| CustomerDay {
                customer_id: row.get("customer_id"),
                net_spend: row.get("net_spend_cents"),
                points_redeemed: row.get("points_redeemed"),
                points_awarded: row.get("points_awarded"),
            })
            .collect())
    }

    /// Entries a given day run sent to the error log.
    pub async fn list_rejected_entries(&self, run_id: DayRunId) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query("SELECT entry FROM error_log WHERE day_run_id = ? ORDER BY sequence")
            .bind(run_id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list rejected entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    fn row_to_day_run(row: &sqlx::sqlite::SqliteRow) -> Result<DayRun> {
        let id_str: String = row.get("id");
        let business_date_str: String = row.get("business_date");
        let processed_at_str: String = row.get("processed_at");

        Ok(DayRun {
            id: Uuid::parse_str(&id_str).context("Invalid day run ID")?,
            business_date: NaiveDate::parse_from_str(&business_date_str, DATE_FORMAT)
                .context("Invalid business_date")?,
            processed_at: DateTime::parse_from_rfc3339(&processed_at_str)
                .context("Invalid processed_at timestamp")?
                .with_timezone(&Utc),
            entries_processed: row.get("entries_processed"),
            entries_rejected: row.get("entries_rejected"),
            total_redeemed: row.get("total_redeemed"),
            total_awarded: row.get("total_awarded"),
        })
    }
}
