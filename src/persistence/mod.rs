//! Typed load/save of every journal collection against a string key-value store.
//!
//! Loads never fail: a missing key yields the documented default and a corrupt
//! value is logged and replaced by the default. List-shaped values are decoded
//! record by record so one bad row does not discard the rest.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::error::{JournalError, Result};
use crate::models::{
    JournalEntry, JournalMap, Settings, Theme, Trade, TradingGoals, Transaction, UserIdentity, UserProfile,
    DEFAULT_MILESTONES,
};

pub mod keys {
    pub const TRADES: &str = "trades";
    pub const TRANSACTIONS: &str = "transactions";
    pub const JOURNAL: &str = "journal";
    pub const MILESTONES: &str = "milestones";
    pub const SETTINGS: &str = "settings";
    pub const CURRENT_USER: &str = "currentUser";
    pub const XP: &str = "xp";
    pub const UNLOCKED_ACHIEVEMENTS: &str = "unlockedAchievements";
    pub const THEME: &str = "theme";
    pub const USER_PROFILE: &str = "userProfile";
    pub const TRADING_GOALS: &str = "tradingGoals";
    pub const LOCAL_ACCOUNTS: &str = "localAccounts";
}

/// String-valued storage backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Process-local store, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries()?.clear();
        Ok(())
    }
}

#[derive(Clone)]
pub struct Persistence {
    backend: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read '{}': {}", key, e);
                None
            }
        }
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        let Some(raw) = self.raw(key) else {
            return default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Error parsing '{}', using default: {}", key, e);
                default()
            }
        }
    }

    /// Like `load_json`, but only a JSON object counts as a stored record.
    fn load_record<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        match self.load_json::<Option<serde_json::Value>>(key, || None) {
            Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Error parsing '{}', using default: {}", key, e);
                default()
            }),
            Some(other) => {
                log::warn!("Expected an object under '{}', found {}; using default", key, other);
                default()
            }
            None => default(),
        }
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let items: Vec<serde_json::Value> = self.load_json(key, Vec::new);
        let total = items.len();

        let parsed: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping malformed record {} in '{}': {}", index, key, e);
                    None
                }
            })
            .collect();

        if parsed.len() != total {
            log::warn!("Loaded {} of {} records from '{}'", parsed.len(), total, key);
        }
        parsed
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.backend.set(key, &json)
    }

    pub fn load_trades(&self) -> Vec<Trade> {
        self.load_list(keys::TRADES)
    }

    pub fn save_trades(&self, trades: &[Trade]) -> Result<()> {
        self.save_json(keys::TRADES, trades)
    }

    pub fn load_transactions(&self) -> Vec<Transaction> {
        self.load_list(keys::TRANSACTIONS)
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        self.save_json(keys::TRANSACTIONS, transactions)
    }

    pub fn load_journal(&self) -> JournalMap {
        let raw: serde_json::Map<String, serde_json::Value> = self.load_json(keys::JOURNAL, serde_json::Map::new);

        raw.into_iter()
            .filter_map(|(date, value)| match serde_json::from_value::<JournalEntry>(value) {
                Ok(entry) => Some((date, entry.normalized())),
                Err(e) => {
                    log::warn!("Skipping malformed journal entry for {}: {}", date, e);
                    None
                }
            })
            .collect()
    }

    pub fn save_journal(&self, journal: &JournalMap) -> Result<()> {
        self.save_json(keys::JOURNAL, journal)
    }

    /// Milestones come back positive, ascending and free of duplicates.
    pub fn load_milestones(&self) -> Vec<i64> {
        let Some(raw) = self.raw(keys::MILESTONES) else {
            return DEFAULT_MILESTONES.to_vec();
        };
        let values: Vec<f64> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Error parsing 'milestones', using defaults: {}", e);
                return DEFAULT_MILESTONES.to_vec();
            }
        };

        let mut milestones: Vec<i64> = values
            .into_iter()
            .filter(|v| v.is_finite() && *v >= 1.0)
            .map(|v| v.trunc() as i64)
            .collect();
        milestones.sort_unstable();
        milestones.dedup();
        milestones
    }

    pub fn save_milestones(&self, milestones: &[i64]) -> Result<()> {
        self.save_json(keys::MILESTONES, milestones)
    }

    pub fn load_settings(&self) -> Settings {
        self.load_record(keys::SETTINGS, Settings::default)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.save_json(keys::SETTINGS, settings)
    }

    pub fn load_current_user(&self) -> Option<UserIdentity> {
        self.load_json(keys::CURRENT_USER, || None)
    }

    /// `None` signs the identity out by removing the key.
    pub fn save_current_user(&self, user: Option<&UserIdentity>) -> Result<()> {
        match user {
            Some(user) => self.save_json(keys::CURRENT_USER, user),
            None => self.backend.remove(keys::CURRENT_USER),
        }
    }

    /// XP is stored as a bare decimal string.
    pub fn load_xp(&self) -> u64 {
        let Some(raw) = self.raw(keys::XP) else {
            return 0;
        };
        parse_xp(&raw).unwrap_or_else(|| {
            log::warn!("Error parsing 'xp' value {:?}, using 0", raw);
            0
        })
    }

    pub fn save_xp(&self, xp: u64) -> Result<()> {
        self.backend.set(keys::XP, &xp.to_string())
    }

    pub fn load_unlocked_achievements(&self) -> Vec<String> {
        self.load_list(keys::UNLOCKED_ACHIEVEMENTS)
    }

    pub fn save_unlocked_achievements(&self, unlocked: &[String]) -> Result<()> {
        self.save_json(keys::UNLOCKED_ACHIEVEMENTS, unlocked)
    }

    /// Theme is stored raw ("dark" / "light"), not as JSON.
    pub fn load_theme(&self) -> Theme {
        let Some(raw) = self.raw(keys::THEME) else {
            return Theme::default();
        };
        Theme::parse(raw.trim_matches('"')).unwrap_or_else(|| {
            log::warn!("Unknown theme {:?}, using dark", raw);
            Theme::default()
        })
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.backend.set(keys::THEME, theme.as_str())
    }

    pub fn load_profile(&self) -> UserProfile {
        self.load_record(keys::USER_PROFILE, UserProfile::default)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.save_json(keys::USER_PROFILE, profile)
    }

    pub fn load_goals(&self) -> TradingGoals {
        self.load_record(keys::TRADING_GOALS, TradingGoals::default)
    }

    pub fn save_goals(&self, goals: &TradingGoals) -> Result<()> {
        self.save_json(keys::TRADING_GOALS, goals)
    }

    /// Offline credentials: lowercased email to Argon2 PHC string.
    pub fn load_local_accounts(&self) -> BTreeMap<String, String> {
        self.load_record(keys::LOCAL_ACCOUNTS, BTreeMap::new)
    }

    pub fn save_local_accounts(&self, accounts: &BTreeMap<String, String>) -> Result<()> {
        self.save_json(keys::LOCAL_ACCOUNTS, accounts)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(key)
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }

    /// Clears every key except the offline credentials.
    pub fn clear_keeping_accounts(&self) -> Result<()> {
        let accounts = self.load_local_accounts();
        self.backend.clear()?;
        if accounts.is_empty() {
            return Ok(());
        }
        self.save_local_accounts(&accounts)
    }
}

fn parse_xp(raw: &str) -> Option<u64> {
    let text = raw.trim().trim_matches('"');
    if let Ok(value) = text.parse::<u64>() {
        return Some(value);
    }
    // Older clients could persist fractional or negative values
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0).trunc() as u64)
}
