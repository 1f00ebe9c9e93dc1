use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

use crate::db::migration_runner;
use crate::error::{JournalError, Result};

/// SQLite handle shared by the key-value store and the sync history.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database file and migrates it.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::prepare(conn, db_path)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?, ":memory:")
    }

    fn prepare(conn: Connection, db_path: &str) -> Result<Self> {
        let report = migration_runner::migrate(&conn, db_path)?;
        migration_runner::verify(&conn)?;
        if !report.applied.is_empty() {
            log::info!(
                "Database at schema version {} ({} migrations applied)",
                migration_runner::latest_version(),
                report.applied.len()
            );
        }
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))
    }
}
