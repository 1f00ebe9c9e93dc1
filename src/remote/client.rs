use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::RemoteError;
use crate::models::{JournalEntry, JournalMap, Settings, Trade, Transaction, UserProfile};

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_size: 10,
        }
    }
}

/// Tokens for a signed-in remote identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    pub uid: String,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// XP and level as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub xp: u64,
    pub level: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-identity remote storage plus the email/password identity provider.
///
/// Every call is independently fallible. Callers keep the local copy
/// authoritative and treat the remote as best-effort.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Backend name for logs and sync history (e.g. "firebase").
    fn backend_name(&self) -> &str;

    /// Creates the account, sets its display name and writes the user
    /// document with default settings.
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<RemoteSession, RemoteError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession, RemoteError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), RemoteError>;

    /// Changes the password of an already signed-in identity.
    async fn update_password(&self, session: &RemoteSession, new_password: &str) -> Result<(), RemoteError>;

    async fn create_trade(&self, session: &RemoteSession, trade: &Trade) -> Result<(), RemoteError>;

    /// Newest first.
    async fn list_trades(&self, session: &RemoteSession) -> Result<Vec<Trade>, RemoteError>;

    async fn delete_trade(&self, session: &RemoteSession, id: &str) -> Result<(), RemoteError>;

    async fn create_transaction(&self, session: &RemoteSession, transaction: &Transaction) -> Result<(), RemoteError>;

    /// Newest first.
    async fn list_transactions(&self, session: &RemoteSession) -> Result<Vec<Transaction>, RemoteError>;

    async fn upsert_journal_entry(
        &self,
        session: &RemoteSession,
        date: &str,
        entry: &JournalEntry,
    ) -> Result<(), RemoteError>;

    async fn delete_journal_entry(&self, session: &RemoteSession, date: &str) -> Result<(), RemoteError>;

    async fn list_journal(&self, session: &RemoteSession) -> Result<JournalMap, RemoteError>;

    async fn upsert_settings(&self, session: &RemoteSession, settings: &Settings) -> Result<(), RemoteError>;

    async fn get_settings(&self, session: &RemoteSession) -> Result<Option<Settings>, RemoteError>;

    async fn upsert_milestones(&self, session: &RemoteSession, milestones: &[i64]) -> Result<(), RemoteError>;

    async fn get_milestones(&self, session: &RemoteSession) -> Result<Option<Vec<i64>>, RemoteError>;

    async fn upsert_progress(&self, session: &RemoteSession, progress: &ProgressSnapshot) -> Result<(), RemoteError>;

    async fn get_progress(&self, session: &RemoteSession) -> Result<Option<ProgressSnapshot>, RemoteError>;

    /// Mirrors name, email and profile fields onto the user document.
    async fn update_profile(
        &self,
        session: &RemoteSession,
        name: &str,
        email: &str,
        profile: &UserProfile,
    ) -> Result<(), RemoteError>;
}
