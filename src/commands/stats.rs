//! Read-only views over the current journal, in the local timezone.

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::calculators::{self, GrowthProjection, PositionSize};
use crate::analytics::metrics::{self, DailyStats, SessionStats};
use crate::analytics::reports::{
    self, DashboardSummary, GoalProgress, MoneyTracker, PsychologyStats, ReportScores, RiskStats, TpSlStatus,
    WeeklySummary,
};
use crate::gamification::{Achievement, LevelProgress, ACHIEVEMENTS};
use crate::state::Journal;

#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    pub achievement: &'static Achievement,
    pub unlocked: bool,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Journal {
    pub fn dashboard(&self) -> DashboardSummary {
        reports::dashboard(&self.store, today(), &Local)
    }

    pub fn tp_sl_status(&self) -> TpSlStatus {
        let today_pl: f64 = metrics::today_trades(&self.store.trades).iter().map(|t| t.pl).sum();
        reports::tp_sl_status(today_pl, &self.store.settings)
    }

    pub fn risk_stats(&self) -> RiskStats {
        reports::risk_stats(&self.store)
    }

    pub fn psychology(&self) -> PsychologyStats {
        reports::psychology(&self.store.trades, &Local)
    }

    pub fn report_scores(&self) -> Option<ReportScores> {
        reports::report_scores(&self.store, &Local)
    }

    pub fn weekly_summary(&self) -> WeeklySummary {
        reports::weekly_summary(&self.store.trades, Utc::now())
    }

    pub fn money_tracker(&self) -> MoneyTracker {
        reports::money_tracker(&self.store.transactions, &self.store.trades)
    }

    pub fn equity_curve(&self) -> Vec<f64> {
        metrics::equity_curve(&self.store.trades, self.store.settings.balance)
    }

    pub fn daily_stats(&self) -> BTreeMap<NaiveDate, DailyStats> {
        metrics::daily_aggregate(&self.store.trades)
    }

    pub fn calendar_month(&self, year: i32, month: u32) -> Vec<(NaiveDate, DailyStats)> {
        reports::calendar_month(&self.store.trades, year, month, &Local)
    }

    pub fn asset_breakdown(&self) -> Vec<(String, f64)> {
        metrics::asset_breakdown(&self.store.trades)
    }

    pub fn session_breakdown(&self) -> Vec<SessionStats> {
        metrics::session_breakdown(&self.store.trades)
    }

    pub fn goal_progress(&self) -> GoalProgress {
        reports::goal_progress(&self.store.trades, &self.goals, today(), &Local)
    }

    pub fn level_progress(&self) -> LevelProgress {
        self.gamification.progress()
    }

    /// Every achievement in table order with its unlock state.
    pub fn achievements(&self) -> Vec<AchievementStatus> {
        ACHIEVEMENTS
            .iter()
            .map(|achievement| AchievementStatus {
                achievement,
                unlocked: self.gamification.is_unlocked(achievement.id),
            })
            .collect()
    }

    /// Compounding projection from the current balance.
    pub fn growth_projection(&self, daily_percent: f64, days: u32) -> GrowthProjection {
        let balance = metrics::current_balance(&self.store.trades, &self.store.settings);
        calculators::growth_projection(balance, daily_percent, days)
    }

    pub fn position_size(&self, risk_percent: f64, payout: f64) -> PositionSize {
        let balance = metrics::current_balance(&self.store.trades, &self.store.settings);
        calculators::position_size(balance, risk_percent, payout)
    }
}
