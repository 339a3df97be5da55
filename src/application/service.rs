use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    CustomerDay, DayRun, DaySummary, Ledger, LogEntry, Points, RewardPolicy,
};
use crate::storage::{DayRecord, Repository};

use super::{AppError, CustomerBalance, DayReport, ItemSales};

/// Application service providing high-level operations on the rewards ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct RewardsService {
    repo: Repository,
    policy: RewardPolicy,
    /// Held for the whole load-process-persist sequence of a day
    day_lock: Mutex<()>,
}

impl RewardsService {
    /// Create a new service with the given repository and the default reward policy.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            policy: RewardPolicy::default(),
            day_lock: Mutex::new(()),
        }
    }

    /// Replace the reward policy used for new days.
    pub fn with_policy(mut self, policy: RewardPolicy) -> Result<Self, AppError> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    // ========================
    // Day processing
    // ========================

    /// Replay one business day's log against the stored ledger and persist the result.
    ///
    /// A date that was already processed is refused unless `force` is set, since
    /// replaying a log twice would double-count items and points.
    pub async fn process_day(
        &self,
        business_date: NaiveDate,
        entries: &[LogEntry],
        force: bool,
    ) -> Result<DayReport, AppError> {
        let _guard = self.day_lock.lock().await;

        if !force && self.is_day_processed(business_date).await? {
            return Err(AppError::DayAlreadyProcessed(business_date));
        }

        let mut ledger = self.load_ledger().await?;
        let errors_before = ledger.error_log().len();

        info!(%business_date, entries = entries.len(), "processing day log");
        let summary = ledger.process_day(entries);

        let run = DayRun::from_summary(business_date, &summary);
        let customers = CustomerDay::from_summary(&summary);
        let rejected = ledger.error_log()[errors_before..].to_vec();

        self.repo
            .save_day(DayRecord {
                run: &run,
                customers: &customers,
                point_balances: ledger.point_balances(),
                item_sale_counts: ledger.item_sale_counts(),
                rejected: &rejected,
            })
            .await?;

        info!(
            %business_date,
            customers = customers.len(),
            rejected = rejected.len(),
            awarded = run.total_awarded,
            redeemed = run.total_redeemed,
            "day committed"
        );

        Ok(DayReport {
            run,
            customers,
            rejected,
        })
    }

    /// Whether a log has already been committed for this business date.
    pub async fn is_day_processed(&self, business_date: NaiveDate) -> Result<bool, AppError> {
        Ok(!self.repo.find_day_runs(business_date).await?.is_empty())
    }

    /// Run a day's log against the stored ledger without saving anything.
    ///
    /// This does not check the business date: previewing a day that was
    /// already committed shows its sales counted a second time.
    pub async fn preview_day(&self, entries: &[LogEntry]) -> Result<DaySummary, AppError> {
        let mut ledger = self.load_ledger().await?;
        debug!(entries = entries.len(), "previewing day log");
        Ok(ledger.process_day(entries))
    }

    async fn load_ledger(&self) -> Result<Ledger, AppError> {
        let point_balances = self.repo.load_point_balances().await?;
        let item_sale_counts = self.repo.load_item_sale_counts().await?;
        let error_log = self.repo.load_error_log().await?;

        debug!(
            customers = point_balances.len(),
            items = item_sale_counts.len(),
            errors = error_log.len(),
            "loaded ledger state"
        );

        Ok(Ledger::restore(
            self.policy,
            point_balances,
            item_sale_counts,
            error_log,
        ))
    }

    // ========================
    // Queries
    // ========================

    /// Current balance; 0 for a customer never seen.
    pub async fn point_balance(&self, customer_id: &str) -> Result<Points, AppError> {
        Ok(self
            .repo
            .get_point_balance(customer_id)
            .await?
            .unwrap_or(0))
    }

    pub async fn all_point_balances(&self) -> Result<Vec<CustomerBalance>, AppError> {
        Ok(self
            .repo
            .list_point_balances()
            .await?
            .into_iter()
            .map(|(customer_id, balance)| CustomerBalance {
                customer_id,
                balance,
            })
            .collect())
    }

    /// Units sold across all processed days; 0 for an item never sold.
    pub async fn item_sale_count(&self, item_id: &str) -> Result<u64, AppError> {
        Ok(self.repo.get_item_sale_count(item_id).await?.unwrap_or(0))
    }

    pub async fn all_item_sale_counts(&self) -> Result<Vec<ItemSales>, AppError> {
        Ok(self
            .repo
            .list_item_sale_counts()
            .await?
            .into_iter()
            .map(|(item_id, units_sold)| ItemSales {
                item_id,
                units_sold,
            })
            .collect())
    }

    pub async fn error_log(&self) -> Result<Vec<LogEntry>, AppError> {
        Ok(self.repo.load_error_log().await?)
    }

    pub async fn list_days(&self) -> Result<Vec<DayRun>, AppError> {
        Ok(self.repo.list_day_runs().await?)
    }

    /// The most recent run for a business date.
    pub async fn get_day(&self, business_date: NaiveDate) -> Result<DayReport, AppError> {
        let run = self
            .repo
            .find_day_runs(business_date)
            .await?
            .pop()
            .ok_or(AppError::DayNotFound(business_date))?;

        let customers = self.repo.list_customer_days(run.id).await?;
        let rejected = self.repo.list_rejected_entries(run.id).await?;

        Ok(DayReport {
            run,
            customers,
            rejected,
        })
    }
}
