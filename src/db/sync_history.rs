use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
}

impl SyncStatus {
    fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
        }
    }

    fn from_db(value: &str) -> Self {
        match value {
            "success" => SyncStatus::Success,
            _ => SyncStatus::Failed,
        }
    }
}

/// One remote write attempt, newest first when listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    pub id: i64,
    pub operation: String,
    pub status: SyncStatus,
    pub error_message: Option<String>,
    pub created_at: i64,
}

impl Database {
    pub fn record_sync(&self, operation: &str, status: SyncStatus, error_message: Option<&str>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sync_history (operation, status, error_message, created_at) VALUES (?, ?, ?, ?)",
            params![operation, status.as_str(), error_message, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn recent_syncs(&self, limit: usize) -> Result<Vec<SyncRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, operation, status, error_message, created_at
             FROM sync_history
             ORDER BY id DESC
             LIMIT ?",
        )?;

        let records = stmt
            .query_map([limit as i64], |row| {
                let status: String = row.get(2)?;
                Ok(SyncRecord {
                    id: row.get(0)?,
                    operation: row.get(1)?,
                    status: SyncStatus::from_db(&status),
                    error_message: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    pub fn clear_sync_history(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sync_history", [])?;
        Ok(())
    }
}
