use crate::error::ValidationError;
use crate::models::{JournalEntry, JournalMap, Settings, Trade, Transaction, DEFAULT_MILESTONES};
use crate::persistence::Persistence;

/// In-memory copy of every persisted collection.
///
/// Trades and transactions are kept most-recent-first, the way they are
/// written to storage; metrics that need chronological order reverse on read.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalStore {
    pub trades: Vec<Trade>,
    pub transactions: Vec<Transaction>,
    pub journal: JournalMap,
    pub milestones: Vec<i64>,
    pub settings: Settings,
}

impl Default for JournalStore {
    fn default() -> Self {
        Self {
            trades: Vec::new(),
            transactions: Vec::new(),
            journal: JournalMap::new(),
            milestones: DEFAULT_MILESTONES.to_vec(),
            settings: Settings::default(),
        }
    }
}

impl JournalStore {
    pub fn load(persistence: &Persistence) -> Self {
        Self {
            trades: persistence.load_trades(),
            transactions: persistence.load_transactions(),
            journal: persistence.load_journal(),
            milestones: persistence.load_milestones(),
            settings: persistence.load_settings(),
        }
    }

    pub fn add_trade(&mut self, trade: Trade) {
        self.trades.insert(0, trade);
    }

    pub fn remove_trade(&mut self, id: &str) -> Option<Trade> {
        let index = self.trades.iter().position(|t| t.id == id)?;
        Some(self.trades.remove(index))
    }

    pub fn find_trade(&self, id: &str) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id == id)
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.insert(0, transaction);
    }

    /// Returns the entry previously stored under `date`, if any.
    pub fn put_journal_entry(&mut self, date: String, entry: JournalEntry) -> Option<JournalEntry> {
        self.journal.insert(date, entry)
    }

    pub fn remove_journal_entry(&mut self, date: &str) -> Option<JournalEntry> {
        self.journal.remove(date)
    }

    /// Inserts a milestone keeping the set ascending.
    pub fn add_milestone(&mut self, value: i64) -> Result<(), ValidationError> {
        if value <= 0 {
            return Err(ValidationError::InvalidMilestone);
        }
        match self.milestones.binary_search(&value) {
            Ok(_) => Err(ValidationError::DuplicateMilestone(value)),
            Err(index) => {
                self.milestones.insert(index, value);
                Ok(())
            }
        }
    }

    pub fn remove_milestone(&mut self, value: i64) -> bool {
        match self.milestones.binary_search(&value) {
            Ok(index) => {
                self.milestones.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_milestones(&mut self, mut milestones: Vec<i64>) {
        milestones.retain(|m| *m > 0);
        milestones.sort_unstable();
        milestones.dedup();
        self.milestones = milestones;
    }

    /// Starting balance plus realized P/L. This is the ceiling for a new stake.
    pub fn available_balance(&self) -> f64 {
        self.settings.balance + self.trades.iter().map(|t| t.pl).sum::<f64>()
    }

    /// Clears trades, transactions and the journal; milestones go back to defaults.
    /// Settings are kept.
    pub fn reset_activity(&mut self) {
        self.trades.clear();
        self.transactions.clear();
        self.journal.clear();
        self.milestones = DEFAULT_MILESTONES.to_vec();
    }
}
