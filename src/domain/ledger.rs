use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Cents, CustomerId, ItemId, LogEntry, Points, RewardPolicy};

/// Store-wide rewards state: point balances, cumulative item sale counts and the
/// error log. All three persist across `process_day` calls on the same instance.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    policy: RewardPolicy,
    point_balances: HashMap<CustomerId, Points>,
    item_sale_counts: HashMap<ItemId, u64>,
    error_log: Vec<LogEntry>,
}

/// Outcome of replaying one business day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaySummary {
    /// Cumulative units sold per item, across every day this ledger has seen
    pub item_sale_counts: BTreeMap<ItemId, u64>,
    /// Net spend per customer for this day only
    pub customer_spend: BTreeMap<CustomerId, Cents>,
    /// Points actually redeemed per customer this day (after clamping)
    pub points_redeemed: BTreeMap<CustomerId, Points>,
    /// End-of-day points awarded per customer
    pub points_awarded: BTreeMap<CustomerId, Points>,
    /// Cumulative error log
    pub error_log: Vec<LogEntry>,
    pub entries_processed: usize,
    pub entries_rejected: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from previously persisted state.
    pub fn restore(
        policy: RewardPolicy,
        point_balances: HashMap<CustomerId, Points>,
        item_sale_counts: HashMap<ItemId, u64>,
        error_log: Vec<LogEntry>,
    ) -> Self {
        Self {
            policy,
            point_balances,
            item_sale_counts,
            error_log,
        }
    }

    /// Replay a day's log in order, then award end-of-day points.
    ///
    /// Entries without an item list go to the error log and touch nothing else.
    /// Items are tallied for every other entry, anonymous or not. Only entries
    /// with a customer redeem points or accumulate spend.
    pub fn process_day(&mut self, entries: &[LogEntry]) -> DaySummary {
        let mut customer_spend: BTreeMap<CustomerId, Cents> = BTreeMap::new();
        let mut points_redeemed: BTreeMap<CustomerId, Points> = BTreeMap::new();
        let mut entries_rejected = 0;

        for entry in entries {
            if entry.is_malformed() {
                warn!(
                    customer = entry.customer_id.as_deref().unwrap_or("-"),
                    "log entry has no purchased items, moved to error log"
                );
                self.error_log.push(entry.clone());
                entries_rejected += 1;
                continue;
            }

            let units = self.tally_items(entry);

            let Some(customer_id) = &entry.customer_id else {
                debug!(units, "anonymous purchase, items tallied only");
                continue;
            };

            let requested = entry.points_redeemed.unwrap_or(0);
            let redeemed = self.redeem(customer_id, requested);
            let net_spend = entry
                .gross_spend()
                .saturating_sub(self.policy.redemption_value(redeemed));

            *points_redeemed.entry(customer_id.clone()).or_insert(0) += redeemed;
            let spend = customer_spend.entry(customer_id.clone()).or_insert(0);
            *spend = spend.saturating_add(net_spend);
        }

        let points_awarded = self.award_points(&customer_spend);

        DaySummary {
            item_sale_counts: self
                .item_sale_counts
                .iter()
                .map(|(id, count)| (id.clone(), *count))
                .collect(),
            customer_spend,
            points_redeemed,
            points_awarded,
            error_log: self.error_log.clone(),
            entries_processed: entries.len(),
            entries_rejected,
        }
    }

    /// Units sold for an item across all processed days; 0 if never sold.
    pub fn item_sale_count(&self, item_id: &str) -> u64 {
        self.item_sale_counts.get(item_id).copied().unwrap_or(0)
    }

    /// Current point balance; 0 for a customer never seen.
    pub fn point_balance(&self, customer_id: &str) -> Points {
        self.point_balances.get(customer_id).copied().unwrap_or(0)
    }

    pub fn point_balances(&self) -> &HashMap<CustomerId, Points> {
        &self.point_balances
    }

    pub fn item_sale_counts(&self) -> &HashMap<ItemId, u64> {
        &self.item_sale_counts
    }

    pub fn error_log(&self) -> &[LogEntry] {
        &self.error_log
    }

    /// Count one sale per unit. Returns the number of units.
    fn tally_items(&mut self, entry: &LogEntry) -> usize {
        let items = entry.purchased_items.as_deref().unwrap_or_default();
        for item in items {
            *self.item_sale_counts.entry(item.id.clone()).or_insert(0) += 1;
        }
        items.len()
    }

    /// Spend up to `requested` points, never more than the customer holds.
    fn redeem(&mut self, customer_id: &CustomerId, requested: Points) -> Points {
        let balance = self.point_balances.entry(customer_id.clone()).or_insert(0);
        let redeemed = requested.min(*balance).max(0);
        *balance -= redeemed;

        if redeemed < requested {
            debug!(
                customer = %customer_id,
                requested,
                redeemed,
                "redemption clamped to available balance"
            );
        }
        redeemed
    }

    fn award_points(
        &mut self,
        customer_spend: &BTreeMap<CustomerId, Cents>,
    ) -> BTreeMap<CustomerId, Points> {
        customer_spend
            .iter()
            .map(|(customer_id, spend)| {
                let award = self.policy.award_for(*spend);
                let balance = self.point_balances.entry(customer_id.clone()).or_insert(0);
                *balance = balance.saturating_add(award);
                (customer_id.clone(), award)
            })
            .collect()
    }
}
