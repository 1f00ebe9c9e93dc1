//! TradeEdge Journal core: trade log, performance analytics, gamification,
//! local persistence and optional Firebase mirroring.
//!
//! Everything a user does goes through a [`Journal`]:
//!
//! ```no_run
//! use tradeedge_journal::{AppConfig, Journal};
//!
//! # fn main() -> tradeedge_journal::Result<()> {
//! let config = AppConfig::from_env();
//! let journal = Journal::open(&config)?;
//! println!("{} trades", journal.trades().len());
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod gamification;
pub mod models;
pub mod persistence;
pub mod remote;
pub mod security;
pub mod state;
pub mod store;

pub use commands::{CloudLoad, DateRange, ImportSummary, ProfileStats, ScreenshotFilter};
pub use config::{AppConfig, FirebaseConfig};
pub use error::{JournalError, Result, ValidationError};
pub use gamification::{Achievement, GamificationState, Level, XpEvent};
pub use remote::{FirebaseBackend, RemoteBackend, RemoteError, SyncOutcome};
pub use state::{ConnectionStatus, Journal, Saved};
pub use store::JournalStore;
