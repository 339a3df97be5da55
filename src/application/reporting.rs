use serde::{Deserialize, Serialize};

use crate::domain::{Cents, CustomerDay, CustomerId, DayRun, ItemId, LogEntry, Points};

/// A processed business day as stored: the run, per-customer rows and rejected entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayReport {
    pub run: DayRun,
    pub customers: Vec<CustomerDay>,
    pub rejected: Vec<LogEntry>,
}

impl DayReport {
    pub fn total_net_spend(&self) -> Cents {
        self.customers
            .iter()
            .fold(0, |total: Cents, c| total.saturating_add(c.net_spend))
    }

    pub fn customer(&self, customer_id: &str) -> Option<&CustomerDay> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBalance {
    pub customer_id: CustomerId,
    pub balance: Points,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    pub item_id: ItemId,
    pub units_sold: u64,
}
