pub mod calculators;
pub mod metrics;
pub mod reports;

pub use metrics::{DailyStats, ProfitFactor};
