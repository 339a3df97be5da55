use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CustomerId, DaySummary, Points};

pub type DayRunId = Uuid;

/// Record that a business day's log has been replayed into the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRun {
    pub id: DayRunId,
    /// The store business day the log belongs to
    pub business_date: NaiveDate,
    /// When the log was processed
    pub processed_at: DateTime<Utc>,
    pub entries_processed: i64,
    pub entries_rejected: i64,
    pub total_redeemed: Points,
    pub total_awarded: Points,
}

/// A customer's activity on one business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDay {
    pub customer_id: CustomerId,
    /// Spend net of redeemed points
    pub net_spend: Cents,
    pub points_redeemed: Points,
    pub points_awarded: Points,
}

impl DayRun {
    pub fn from_summary(business_date: NaiveDate, summary: &DaySummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_date,
            processed_at: Utc::now(),
            entries_processed: summary.entries_processed as i64,
            entries_rejected: summary.entries_rejected as i64,
            total_redeemed: saturating_total(summary.points_redeemed.values()),
            total_awarded: saturating_total(summary.points_awarded.values()),
        }
    }
}

impl CustomerDay {
    /// One row per customer that spent (or redeemed) during the day, ordered by customer id.
    pub fn from_summary(summary: &DaySummary) -> Vec<Self> {
        summary
            .customer_spend
            .iter()
            .map(|(customer_id, net_spend)| CustomerDay {
                customer_id: customer_id.clone(),
                net_spend: *net_spend,
                points_redeemed: summary
                    .points_redeemed
                    .get(customer_id)
                    .copied()
                    .unwrap_or(0),
                points_awarded: summary
                    .points_awarded
                    .get(customer_id)
                    .copied()
                    .unwrap_or(0),
            })
            .collect()
    }
}

fn saturating_total<'a>(values: impl Iterator<Item = &'a i64>) -> i64 {
    values.fold(0, |total: i64, value| total.saturating_add(*value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Item, Ledger, LogEntry};

    #[test]
    fn test_day_records_from_summary() {
        let mut ledger = Ledger::new();
        let summary = ledger.process_day(&[
            LogEntry::new(vec![Item::new("apple", 10000)]).with_customer("c2"),
            LogEntry::new(vec![Item::new("apple", 36000)]).with_customer("c1"),
            LogEntry::default().without_items(),
        ]);

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let run = DayRun::from_summary(date, &summary);
        assert_eq!(run.business_date, date);
        assert_eq!(run.entries_processed, 3);
        assert_eq!(run.entries_rejected, 1);
        assert_eq!(run.total_awarded, 5 + 21);

        let customers = CustomerDay::from_summary(&summary);
        let ids: Vec<_> = customers.iter().map(|c| c.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(customers[0].net_spend, 36000);
        assert_eq!(customers[0].points_awarded, 21); // 360 / 17
    }

    #[test]
    fn test_day_totals_saturate() {
        let mut summary = DaySummary::default();
        summary.points_awarded.insert("c1".to_string(), Points::MAX);
        summary.points_awarded.insert("c2".to_string(), Points::MAX);

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(DayRun::from_summary(date, &summary).total_awarded, Points::MAX);
    }
}
