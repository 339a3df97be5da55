use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::PolicyError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Business day {0} has already been processed (use --force to process it again)")]
    DayAlreadyProcessed(NaiveDate),

    #[error("No processed log for business day {0}")]
    DayNotFound(NaiveDate),

    #[error("Invalid reward policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
