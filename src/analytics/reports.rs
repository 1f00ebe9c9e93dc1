//! Derived views composed from the metric reducers.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::{self, DailyStats, ProfitFactor, OVERTRADING_THRESHOLD};
use crate::models::{parse_journal_date, JournalEntry, JournalMap, Settings, Trade, TradeResult, Transaction, TradingGoals, MOOD_LABELS};
use crate::store::JournalStore;

/// Minimum sample before report scores are shown.
pub const REPORT_MIN_TRADES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub balance: f64,
    pub total_pl: f64,
    pub change_percent: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub today_pl: f64,
    pub best_streak: usize,
    pub profit_factor: ProfitFactor,
}

pub fn dashboard<Tz: TimeZone>(store: &JournalStore, today: NaiveDate, tz: &Tz) -> DashboardSummary {
    let trades = &store.trades;
    let total_pl = metrics::total_pl(trades);
    let counts = metrics::win_loss_counts(trades);

    DashboardSummary {
        balance: metrics::current_balance(trades, &store.settings),
        total_pl,
        change_percent: percent_of(total_pl, store.settings.balance),
        win_rate: metrics::win_rate(trades),
        total_trades: trades.len(),
        wins: counts.wins,
        losses: counts.losses,
        today_pl: day_pl(trades, today, tz),
        best_streak: metrics::max_streak(trades, TradeResult::Win),
        profit_factor: metrics::profit_factor(trades),
    }
}

fn day_pl<Tz: TimeZone>(trades: &[Trade], day: NaiveDate, tz: &Tz) -> f64 {
    metrics::trades_on(trades, day, tz).iter().map(|t| t.pl).sum()
}

fn percent_of(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        value * 100.0 / base
    }
}

/// Same-day result measured against the daily take-profit / stop-loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TpSlStatus {
    TakeProfitHit { today_percent: f64 },
    StopLossHit { today_percent: f64 },
    Active {
        today_percent: f64,
        tp_progress: f64,
        sl_progress: f64,
    },
}

pub fn tp_sl_status(today_pl: f64, settings: &Settings) -> TpSlStatus {
    let today_percent = percent_of(today_pl, settings.balance);

    if today_percent >= settings.tp {
        TpSlStatus::TakeProfitHit { today_percent }
    } else if today_percent <= -settings.sl {
        TpSlStatus::StopLossHit { today_percent }
    } else {
        let tp_progress = if settings.tp > 0.0 {
            (today_percent / settings.tp * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let sl_progress = if settings.sl > 0.0 && today_percent < 0.0 {
            (today_percent.abs() / settings.sl * 100.0).min(100.0)
        } else {
            0.0
        };
        TpSlStatus::Active {
            today_percent,
            tp_progress,
            sl_progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

pub fn risk_level(win_rate: f64) -> RiskLevel {
    if win_rate >= 60.0 {
        RiskLevel::Low
    } else if win_rate >= 50.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskStats {
    pub max_drawdown: f64,
    pub risk_level: RiskLevel,
    pub max_loss_streak: usize,
    pub balance: f64,
}

pub fn risk_stats(store: &JournalStore) -> RiskStats {
    let trades = &store.trades;
    RiskStats {
        max_drawdown: metrics::max_drawdown(trades, store.settings.balance),
        risk_level: risk_level(metrics::win_rate(trades)),
        max_loss_streak: metrics::max_streak(trades, TradeResult::Loss),
        balance: metrics::current_balance(trades, &store.settings),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsychologyStats {
    pub revenge_trades: usize,
    pub overtrading_days: usize,
    pub best_session: Option<String>,
}

pub fn psychology<Tz: TimeZone>(trades: &[Trade], tz: &Tz) -> PsychologyStats {
    PsychologyStats {
        revenge_trades: metrics::revenge_trade_count(trades),
        overtrading_days: metrics::overtrading_days_in(trades, OVERTRADING_THRESHOLD, tz),
        best_session: metrics::best_session(trades),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportScores {
    pub consistency: f64,
    pub discipline: f64,
    pub behavioral: f64,
}

/// `None` until there are enough trades to score.
pub fn report_scores<Tz: TimeZone>(store: &JournalStore, tz: &Tz) -> Option<ReportScores> {
    let trades = &store.trades;
    if trades.len() < REPORT_MIN_TRADES {
        return None;
    }

    // Strictly more than the overtrading threshold here
    let heavy_days = metrics::daily_aggregate_in(trades, tz)
        .values()
        .filter(|d| d.trades > OVERTRADING_THRESHOLD)
        .count();

    Some(ReportScores {
        consistency: (metrics::win_rate(trades) + 20.0).min(100.0),
        discipline: (100.0 - heavy_days as f64 * 10.0).max(0.0),
        behavioral: (store.journal.len() as f64 * 10.0).min(100.0),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub trades: usize,
    pub wins: usize,
    pub pl: f64,
    pub win_rate: f64,
}

pub fn weekly_summary(trades: &[Trade], now: DateTime<Utc>) -> WeeklySummary {
    let week_ago = now - Duration::days(7);
    let recent: Vec<&Trade> = trades.iter().filter(|t| t.timestamp >= week_ago).collect();
    let wins = recent.iter().filter(|t| t.is_win()).count();

    WeeklySummary {
        trades: recent.len(),
        wins,
        pl: recent.iter().map(|t| t.pl).sum(),
        win_rate: if recent.is_empty() {
            0.0
        } else {
            wins as f64 / recent.len() as f64 * 100.0
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoneyTracker {
    pub deposits: f64,
    pub withdrawals: f64,
    pub trade_pl: f64,
    pub real_net_profit: f64,
}

pub fn money_tracker(transactions: &[Transaction], trades: &[Trade]) -> MoneyTracker {
    let (withdrawals, deposits): (Vec<&Transaction>, Vec<&Transaction>) =
        transactions.iter().partition(|t| t.is_withdrawal());
    let deposits: f64 = deposits.iter().map(|t| t.amount).sum();
    let withdrawals: f64 = withdrawals.iter().map(|t| t.amount).sum();
    let trade_pl = metrics::total_pl(trades);

    MoneyTracker {
        deposits,
        withdrawals,
        trade_pl,
        real_net_profit: withdrawals - deposits + trade_pl,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MilestoneProgress {
    pub target: i64,
    pub complete: bool,
    pub remaining: f64,
    pub percent: f64,
}

pub fn milestone_progress(milestones: &[i64], total_pl: f64) -> Vec<MilestoneProgress> {
    milestones
        .iter()
        .map(|&target| {
            let goal = target as f64;
            MilestoneProgress {
                target,
                complete: total_pl >= goal,
                remaining: (goal - total_pl).max(0.0),
                percent: (total_pl / goal * 100.0).clamp(0.0, 100.0),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalStats {
    pub entries: usize,
    pub average_mood: Option<f64>,
    pub mood_label: Option<&'static str>,
    pub average_discipline_percent: Option<f64>,
    pub streak: usize,
}

pub fn journal_stats(journal: &JournalMap, today: NaiveDate) -> JournalStats {
    if journal.is_empty() {
        return JournalStats {
            entries: 0,
            average_mood: None,
            mood_label: None,
            average_discipline_percent: None,
            streak: 0,
        };
    }

    let count = journal.len() as f64;
    let average_mood = journal.values().map(|e| f64::from(e.mood)).sum::<f64>() / count;
    let average_discipline = journal.values().map(|e| f64::from(e.discipline)).sum::<f64>() / count;
    let mood_label = MOOD_LABELS
        .get((average_mood.round() as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("Neutral");

    JournalStats {
        entries: journal.len(),
        average_mood: Some(average_mood),
        mood_label: Some(mood_label),
        average_discipline_percent: Some(average_discipline * 10.0),
        streak: writing_streak(journal, today),
    }
}

/// Consecutive journaled days, newest first, allowed to start yesterday.
pub fn writing_streak(journal: &JournalMap, today: NaiveDate) -> usize {
    let mut check = today;
    let mut streak = 0;
    for date in journal.keys().rev().filter_map(|k| parse_journal_date(k)) {
        if (check - date).num_days() <= 1 {
            streak += 1;
            check = date;
        } else {
            break;
        }
    }
    streak
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JournalSort {
    #[default]
    Newest,
    Oldest,
    MoodHigh,
    MoodLow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalQuery {
    pub search: Option<String>,
    pub mood: Option<u8>,
    #[serde(default)]
    pub sort: JournalSort,
}

/// Filters by text (sections or date key) and mood, then sorts.
pub fn filter_journal<'a>(journal: &'a JournalMap, query: &JournalQuery) -> Vec<(&'a str, &'a JournalEntry)> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut entries: Vec<(&str, &JournalEntry)> = journal
        .iter()
        .map(|(date, entry)| (date.as_str(), entry))
        .filter(|(date, entry)| match &needle {
            Some(needle) => entry.matches(needle) || date.contains(needle.as_str()),
            None => true,
        })
        .filter(|(_, entry)| query.mood.map_or(true, |m| entry.mood == m))
        .collect();

    // Keys are ISO dates, so they sort chronologically as strings
    match query.sort {
        JournalSort::Newest => entries.sort_by(|a, b| b.0.cmp(a.0)),
        JournalSort::Oldest => entries.sort_by(|a, b| a.0.cmp(b.0)),
        JournalSort::MoodHigh => entries.sort_by(|a, b| b.1.mood.cmp(&a.1.mood)),
        JournalSort::MoodLow => entries.sort_by(|a, b| a.1.mood.cmp(&b.1.mood)),
    }
    entries
}

/// Every day of the month with its aggregate (zeroed when there were no trades).
pub fn calendar_month<Tz: TimeZone>(trades: &[Trade], year: i32, month: u32, tz: &Tz) -> Vec<(NaiveDate, DailyStats)> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let days = metrics::daily_aggregate_in(trades, tz);

    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|d| (d, days.get(&d).copied().unwrap_or_default()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub month_pl: f64,
    pub monthly_profit_target: f64,
    pub win_rate: f64,
    pub win_rate_target: f64,
    pub today_trades: usize,
    pub max_trades: u32,
    pub trading_days: usize,
    pub trading_days_target: u32,
}

impl GoalProgress {
    pub fn profit_met(&self) -> bool {
        self.month_pl >= self.monthly_profit_target
    }

    pub fn win_rate_met(&self) -> bool {
        self.win_rate >= self.win_rate_target
    }

    pub fn within_trade_limit(&self) -> bool {
        self.today_trades <= self.max_trades as usize
    }
}

pub fn goal_progress<Tz: TimeZone>(trades: &[Trade], goals: &TradingGoals, today: NaiveDate, tz: &Tz) -> GoalProgress {
    let this_month: Vec<(NaiveDate, DailyStats)> = metrics::daily_aggregate_in(trades, tz)
        .into_iter()
        .filter(|(d, _)| d.year() == today.year() && d.month() == today.month())
        .collect();

    GoalProgress {
        month_pl: this_month.iter().map(|(_, s)| s.pl).sum(),
        monthly_profit_target: goals.monthly_profit,
        win_rate: metrics::win_rate(trades),
        win_rate_target: goals.win_rate,
        today_trades: metrics::trades_on(trades, today, tz).len(),
        max_trades: goals.max_trades,
        trading_days: this_month.len(),
        trading_days_target: goals.trading_days,
    }
}
