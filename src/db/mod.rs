pub mod connection;
pub mod kv_store;
pub mod migration_runner;
pub mod sync_history;

pub use connection::Database;
pub use sync_history::{SyncRecord, SyncStatus};
