pub mod achievements;
pub mod levels;

use serde::{Deserialize, Serialize};

use crate::models::TradeResult;
use crate::store::JournalStore;

pub use achievements::{Achievement, ACHIEVEMENTS};
pub use levels::{current_level, level_progress, Level, LevelProgress, LEVELS};

/// Things that earn XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XpEvent {
    TradeSaved(TradeResult),
    JournalSaved,
    AchievementUnlocked(u64),
}

impl XpEvent {
    pub fn amount(&self) -> u64 {
        match self {
            XpEvent::TradeSaved(TradeResult::Win) => 15,
            XpEvent::TradeSaved(_) => 5,
            XpEvent::JournalSaved => 10,
            XpEvent::AchievementUnlocked(reward) => *reward,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationState {
    pub xp: u64,
    /// Append-only, in unlock order.
    pub unlocked: Vec<String>,
}

impl GamificationState {
    pub fn new(xp: u64, unlocked: Vec<String>) -> Self {
        Self { xp, unlocked }
    }

    /// Adds the event's XP and returns the amount awarded.
    pub fn record(&mut self, event: XpEvent) -> u64 {
        let amount = event.amount();
        self.xp = self.xp.saturating_add(amount);
        amount
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u == id)
    }

    /// Evaluates every locked achievement against `store`, unlocking and
    /// rewarding the ones whose predicate now holds. Running it again without
    /// a change in `store` unlocks nothing.
    pub fn unlock_pass(&mut self, store: &JournalStore) -> Vec<&'static Achievement> {
        let newly: Vec<&'static Achievement> = ACHIEVEMENTS
            .iter()
            .filter(|a| !self.is_unlocked(a.id) && a.is_met(store))
            .collect();

        for achievement in &newly {
            self.unlocked.push(achievement.id.to_string());
            self.record(XpEvent::AchievementUnlocked(achievement.xp_reward));
            log::info!("Achievement unlocked: {} (+{} XP)", achievement.name, achievement.xp_reward);
        }
        newly
    }

    pub fn level(&self) -> &'static Level {
        current_level(self.xp)
    }

    pub fn progress(&self) -> LevelProgress {
        level_progress(self.xp)
    }

    pub fn reset(&mut self) {
        self.xp = 0;
        self.unlocked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::metrics::tests::make_trade;
    use crate::models::JournalEntry;

    #[test]
    fn test_xp_awards() {
        let mut state = GamificationState::default();
        assert_eq!(state.record(XpEvent::TradeSaved(TradeResult::Win)), 15);
        assert_eq!(state.record(XpEvent::TradeSaved(TradeResult::Loss)), 5);
        assert_eq!(state.record(XpEvent::TradeSaved(TradeResult::Breakeven)), 5);
        assert_eq!(state.record(XpEvent::JournalSaved), 10);
        assert_eq!(state.xp, 35);
    }

    #[test]
    fn test_unlock_pass_is_idempotent() {
        let mut store = JournalStore::default();
        store.add_trade(make_trade(TradeResult::Win, 100.0, 85.0));

        let mut state = GamificationState::default();
        let first: Vec<&str> = state.unlock_pass(&store).iter().map(|a| a.id).collect();
        assert_eq!(first, vec!["first_trade", "first_win", "profitable"]);
        assert_eq!(state.xp, 75);

        let xp_after_first = state.xp;
        assert!(state.unlock_pass(&store).is_empty());
        assert_eq!(state.xp, xp_after_first);
        assert_eq!(state.unlocked.len(), 3);
    }

    #[test]
    fn test_unlocks_never_revoked() {
        let mut store = JournalStore::default();
        store.add_trade(make_trade(TradeResult::Win, 100.0, 85.0));
        let mut state = GamificationState::default();
        state.unlock_pass(&store);

        store.trades.clear();
        state.unlock_pass(&store);
        assert!(state.is_unlocked("first_trade"));
    }

    #[test]
    fn test_xp_monotonic_across_events() {
        let mut store = JournalStore::default();
        let mut state = GamificationState::default();
        let mut last = state.xp;

        for i in 0..30 {
            let result = if i % 3 == 0 { TradeResult::Loss } else { TradeResult::Win };
            store.add_trade(make_trade(result, 10.0, 85.0));
            state.record(XpEvent::TradeSaved(result));
            assert!(state.xp >= last);
            last = state.xp;

            if i % 4 == 0 {
                store.put_journal_entry(format!("2024-06-{:02}", i + 1), JournalEntry::default());
                state.record(XpEvent::JournalSaved);
                assert!(state.xp >= last);
                last = state.xp;
            }

            state.unlock_pass(&store);
            assert!(state.xp >= last);
            last = state.xp;
        }
        assert!(state.is_unlocked("journal_week"));
        assert!(state.level().level >= 2);
    }
}
