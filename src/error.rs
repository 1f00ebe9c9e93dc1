use thiserror::Error;

use crate::remote::RemoteError;

/// User-input problems. Returned before any state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please select an asset")]
    MissingAsset,

    #[error("Please select direction (CALL/PUT)")]
    MissingDirection,

    #[error("Please select result")]
    MissingResult,

    #[error("Please enter valid stake amount")]
    NonPositiveStake,

    #[error("Stake exceeds available balance (${available:.2})")]
    StakeExceedsBalance { stake: f64, available: f64 },

    #[error("Enter valid amount")]
    NonPositiveAmount,

    #[error("Invalid journal date: {0}")]
    InvalidDate(String),

    #[error("Milestone must be a positive amount")]
    InvalidMilestone,

    #[error("Milestone {0} already exists")]
    DuplicateMilestone(i64),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

#[derive(Error, Debug)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        JournalError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;
