//! In-process backend used by tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::client::{ProgressSnapshot, RemoteBackend, RemoteSession};
use super::error::{auth_message, RemoteError};
use crate::models::{JournalEntry, JournalMap, Settings, Trade, Transaction, UserProfile};

#[derive(Debug, Default, Clone)]
pub struct MockData {
    pub accounts: HashMap<String, (String, String)>, // email -> (password, uid)
    pub trades: Vec<Trade>,
    pub transactions: Vec<Transaction>,
    pub journal: JournalMap,
    pub settings: Option<Settings>,
    pub milestones: Option<Vec<i64>>,
    pub progress: Option<ProgressSnapshot>,
    pub profile: Option<(String, String, UserProfile)>,
    pub reset_requests: Vec<String>,
    pub calls: Vec<&'static str>,
}

#[derive(Default)]
pub struct MockBackend {
    data: Mutex<MockData>,
    failing: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    pub fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap()
    }

    /// Makes every later call to `operation` fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().push(operation);
    }

    fn call(&self, operation: &'static str) -> Result<MutexGuard<'_, MockData>, RemoteError> {
        let mut data = self.data();
        data.calls.push(operation);
        if self.failing.lock().unwrap().contains(&operation) {
            return Err(RemoteError::Backend {
                status: 503,
                message: format!("{} unavailable", operation),
            });
        }
        Ok(data)
    }

    fn session(uid: &str, email: &str, name: Option<String>) -> RemoteSession {
        RemoteSession {
            uid: uid.to_string(),
            id_token: format!("token-{}", uid),
            refresh_token: String::new(),
            email: email.to_string(),
            display_name: name,
        }
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    fn backend_name(&self) -> &str {
        "mock"
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<RemoteSession, RemoteError> {
        let mut data = self.call("sign_up")?;
        if data.accounts.contains_key(email) {
            return Err(RemoteError::from_auth_code("EMAIL_EXISTS"));
        }
        let uid = format!("uid-{}", data.accounts.len() + 1);
        data.accounts.insert(email.to_string(), (password.to_string(), uid.clone()));
        data.settings = Some(Settings::default());
        Ok(Self::session(&uid, email, Some(name.to_string())))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession, RemoteError> {
        let data = self.call("sign_in")?;
        match data.accounts.get(email) {
            None => Err(RemoteError::from_auth_code("EMAIL_NOT_FOUND")),
            Some((stored, _)) if stored != password => {
                Err(RemoteError::Authentication(auth_message("INVALID_PASSWORD").to_string()))
            }
            Some((_, uid)) => Ok(Self::session(uid, email, None)),
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), RemoteError> {
        let mut data = self.call("send_password_reset")?;
        data.reset_requests.push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, session: &RemoteSession, new_password: &str) -> Result<(), RemoteError> {
        let mut data = self.call("update_password")?;
        if let Some(account) = data.accounts.get_mut(&session.email) {
            account.0 = new_password.to_string();
        }
        Ok(())
    }

    async fn create_trade(&self, _session: &RemoteSession, trade: &Trade) -> Result<(), RemoteError> {
        self.call("create_trade")?.trades.insert(0, trade.clone());
        Ok(())
    }

    async fn list_trades(&self, _session: &RemoteSession) -> Result<Vec<Trade>, RemoteError> {
        let mut trades = self.call("list_trades")?.trades.clone();
        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(trades)
    }

    async fn delete_trade(&self, _session: &RemoteSession, id: &str) -> Result<(), RemoteError> {
        self.call("delete_trade")?.trades.retain(|t| t.id != id);
        Ok(())
    }

    async fn create_transaction(&self, _session: &RemoteSession, transaction: &Transaction) -> Result<(), RemoteError> {
        self.call("create_transaction")?
            .transactions
            .insert(0, transaction.clone());
        Ok(())
    }

    async fn list_transactions(&self, _session: &RemoteSession) -> Result<Vec<Transaction>, RemoteError> {
        Ok(self.call("list_transactions")?.transactions.clone())
    }

    async fn upsert_journal_entry(
        &self,
        _session: &RemoteSession,
        date: &str,
        entry: &JournalEntry,
    ) -> Result<(), RemoteError> {
        self.call("save_journal")?
            .journal
            .insert(date.to_string(), entry.clone());
        Ok(())
    }

    async fn delete_journal_entry(&self, _session: &RemoteSession, date: &str) -> Result<(), RemoteError> {
        self.call("delete_journal")?.journal.remove(date);
        Ok(())
    }

    async fn list_journal(&self, _session: &RemoteSession) -> Result<JournalMap, RemoteError> {
        Ok(self.call("list_journal")?.journal.clone())
    }

    async fn upsert_settings(&self, _session: &RemoteSession, settings: &Settings) -> Result<(), RemoteError> {
        self.call("save_settings")?.settings = Some(settings.clone());
        Ok(())
    }

    async fn get_settings(&self, _session: &RemoteSession) -> Result<Option<Settings>, RemoteError> {
        Ok(self.call("get_settings")?.settings.clone())
    }

    async fn upsert_milestones(&self, _session: &RemoteSession, milestones: &[i64]) -> Result<(), RemoteError> {
        self.call("save_milestones")?.milestones = Some(milestones.to_vec());
        Ok(())
    }

    async fn get_milestones(&self, _session: &RemoteSession) -> Result<Option<Vec<i64>>, RemoteError> {
        Ok(self.call("get_milestones")?.milestones.clone())
    }

    async fn upsert_progress(&self, _session: &RemoteSession, progress: &ProgressSnapshot) -> Result<(), RemoteError> {
        self.call("save_progress")?.progress = Some(progress.clone());
        Ok(())
    }

    async fn get_progress(&self, _session: &RemoteSession) -> Result<Option<ProgressSnapshot>, RemoteError> {
        Ok(self.call("get_progress")?.progress.clone())
    }

    async fn update_profile(
        &self,
        _session: &RemoteSession,
        name: &str,
        email: &str,
        profile: &UserProfile,
    ) -> Result<(), RemoteError> {
        self.call("save_profile")?.profile = Some((name.to_string(), email.to_string(), profile.clone()));
        Ok(())
    }
}
