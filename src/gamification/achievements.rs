use serde::Serialize;

use crate::analytics::metrics;
use crate::models::TradeResult;
use crate::store::JournalStore;

pub const UNLOCK_XP: u64 = 25;

/// A fixed achievement. `predicate` must be a pure read of the snapshot.
#[derive(Clone, Copy, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub icon: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub predicate: fn(&JournalStore) -> bool,
    pub xp_reward: u64,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement").field("id", &self.id).finish()
    }
}

impl Achievement {
    pub fn is_met(&self, store: &JournalStore) -> bool {
        (self.predicate)(store)
    }
}

fn win_streak(store: &JournalStore) -> usize {
    metrics::max_streak(&store.trades, TradeResult::Win)
}

fn win_rate_with_sample(store: &JournalStore, min_trades: usize, rate: f64) -> bool {
    store.trades.len() >= min_trades && metrics::win_rate(&store.trades) >= rate
}

pub static ACHIEVEMENTS: [Achievement; 12] = [
    Achievement {
        id: "first_trade",
        icon: "🎯",
        name: "First Trade",
        description: "Log your first trade",
        predicate: |s| !s.trades.is_empty(),
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "ten_trades",
        icon: "📊",
        name: "10 Trades",
        description: "Complete 10 trades",
        predicate: |s| s.trades.len() >= 10,
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "fifty_trades",
        icon: "💯",
        name: "50 Trades",
        description: "Complete 50 trades",
        predicate: |s| s.trades.len() >= 50,
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "first_win",
        icon: "✅",
        name: "First Win",
        description: "Win your first trade",
        predicate: |s| s.trades.iter().any(|t| t.is_win()),
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "win_streak_3",
        icon: "🔥",
        name: "3 Win Streak",
        description: "Win 3 trades in a row",
        predicate: |s| win_streak(s) >= 3,
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "win_streak_5",
        icon: "🔥🔥",
        name: "5 Win Streak",
        description: "Win 5 trades in a row",
        predicate: |s| win_streak(s) >= 5,
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "win_streak_10",
        icon: "💎",
        name: "10 Win Streak",
        description: "Win 10 trades in a row",
        predicate: |s| win_streak(s) >= 10,
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "win_rate_60",
        icon: "📈",
        name: "60% Win Rate",
        description: "Achieve 60% win rate (min 10 trades)",
        predicate: |s| win_rate_with_sample(s, 10, 60.0),
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "win_rate_70",
        icon: "🏆",
        name: "70% Win Rate",
        description: "Achieve 70% win rate (min 20 trades)",
        predicate: |s| win_rate_with_sample(s, 20, 70.0),
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "profitable",
        icon: "💰",
        name: "Profitable",
        description: "Have positive total P/L",
        predicate: |s| metrics::total_pl(&s.trades) > 0.0,
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "first_withdrawal",
        icon: "🏦",
        name: "First Withdrawal",
        description: "Make your first withdrawal",
        predicate: |s| s.transactions.iter().any(|t| t.is_withdrawal()),
        xp_reward: UNLOCK_XP,
    },
    Achievement {
        id: "journal_week",
        icon: "📓",
        name: "Journaling Week",
        description: "Write 7 journal entries",
        predicate: |s| s.journal.len() >= 7,
        xp_reward: UNLOCK_XP,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}
