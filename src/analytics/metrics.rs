//! Pure reducers over the trade list.
//!
//! Every function takes trades in storage order (most recent first) and
//! never mutates them. Ratios special-case empty denominators instead of
//! producing NaN.

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Settings, Trade, TradeResult};

/// Days with at least this many trades count as overtrading.
pub const OVERTRADING_THRESHOLD: usize = 10;

pub fn total_pl(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.pl).sum()
}

/// Percentage of winning trades, 0 for an empty list.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Longest run of consecutive trades (storage order) with the given result.
pub fn max_streak(trades: &[Trade], result: TradeResult) -> usize {
    let mut max = 0;
    let mut current = 0;
    for trade in trades {
        if trade.result == result {
            current += 1;
            max = max.max(current);
        } else {
            current = 0;
        }
    }
    max
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ProfitFactor {
    Ratio(f64),
    /// Profit with no losing trades.
    Infinite,
    /// Neither profit nor loss to compare.
    Undefined,
}

impl ProfitFactor {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ProfitFactor::Ratio(v) => Some(*v),
            ProfitFactor::Infinite => Some(f64::INFINITY),
            ProfitFactor::Undefined => None,
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitFactor::Ratio(v) => write!(f, "{:.2}", v),
            ProfitFactor::Infinite => write!(f, "∞"),
            ProfitFactor::Undefined => write!(f, "--"),
        }
    }
}

pub fn profit_factor(trades: &[Trade]) -> ProfitFactor {
    let gross_profit: f64 = trades.iter().filter(|t| t.pl > 0.0).map(|t| t.pl).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.pl < 0.0).map(|t| t.pl.abs()).sum();

    if gross_loss > 0.0 {
        ProfitFactor::Ratio(gross_profit / gross_loss)
    } else if gross_profit > 0.0 {
        ProfitFactor::Infinite
    } else {
        ProfitFactor::Undefined
    }
}

/// Running equity, oldest first, starting with `starting_balance` before any trade.
pub fn equity_curve(trades: &[Trade], starting_balance: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut equity = starting_balance;
    curve.push(equity);
    for trade in trades.iter().rev() {
        equity += trade.pl;
        curve.push(equity);
    }
    curve
}

/// Largest peak-to-trough decline of the equity curve, in percent.
pub fn max_drawdown(trades: &[Trade], starting_balance: f64) -> f64 {
    let mut peak = starting_balance;
    let mut max_dd: f64 = 0.0;

    for equity in equity_curve(trades, starting_balance) {
        if equity > peak {
            peak = equity;
        }
        if peak <= 0.0 {
            continue;
        }
        let drawdown = (peak - equity) / peak * 100.0;
        max_dd = max_dd.max(drawdown);
    }
    max_dd
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyStats {
    pub pl: f64,
    pub trades: usize,
    pub wins: usize,
}

impl DailyStats {
    pub fn win_rate(&self) -> f64 {
        if self.trades == 0 {
            0.0
        } else {
            self.wins as f64 / self.trades as f64 * 100.0
        }
    }
}

/// Per calendar day (local time) totals.
pub fn daily_aggregate(trades: &[Trade]) -> BTreeMap<NaiveDate, DailyStats> {
    daily_aggregate_in(trades, &Local)
}

pub fn daily_aggregate_in<Tz: TimeZone>(trades: &[Trade], tz: &Tz) -> BTreeMap<NaiveDate, DailyStats> {
    let mut days: BTreeMap<NaiveDate, DailyStats> = BTreeMap::new();
    for trade in trades {
        let day = days.entry(trade.date_in(tz)).or_default();
        day.pl += trade.pl;
        day.trades += 1;
        if trade.is_win() {
            day.wins += 1;
        }
    }
    days
}

/// Wins that immediately follow two or more consecutive losses.
pub fn revenge_trade_count(trades: &[Trade]) -> usize {
    let mut count = 0;
    let mut loss_streak = 0;
    for trade in trades {
        match trade.result {
            TradeResult::Loss => loss_streak += 1,
            TradeResult::Win if loss_streak >= 2 => {
                count += 1;
                loss_streak = 0;
            }
            _ => loss_streak = 0,
        }
    }
    count
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub session: String,
    pub wins: usize,
    pub total: usize,
    pub win_rate: f64,
}

/// Win rate per session label, in first-seen order.
pub fn session_breakdown(trades: &[Trade]) -> Vec<SessionStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for trade in trades {
        let entry = counts.entry(trade.session.as_str()).or_insert_with(|| {
            order.push(trade.session.as_str());
            (0, 0)
        });
        entry.1 += 1;
        if trade.is_win() {
            entry.0 += 1;
        }
    }

    order
        .into_iter()
        .map(|session| {
            let (wins, total) = counts[&session];
            SessionStats {
                session: session.to_string(),
                wins,
                total,
                win_rate: wins as f64 / total as f64 * 100.0,
            }
        })
        .collect()
}

/// Session with the strictly highest win rate; ties keep the first seen.
/// Sessions without a single win never qualify.
pub fn best_session(trades: &[Trade]) -> Option<String> {
    let mut best: Option<SessionStats> = None;
    for stats in session_breakdown(trades) {
        let current = best.as_ref().map(|b| b.win_rate).unwrap_or(0.0);
        if stats.win_rate > current {
            best = Some(stats);
        }
    }
    best.map(|b| b.session)
}

/// Summed P/L per asset, in first-seen order.
pub fn asset_breakdown(trades: &[Trade]) -> Vec<(String, f64)> {
    let mut breakdown: Vec<(String, f64)> = Vec::new();
    for trade in trades {
        match breakdown.iter_mut().find(|(asset, _)| *asset == trade.asset) {
            Some((_, pl)) => *pl += trade.pl,
            None => breakdown.push((trade.asset.clone(), trade.pl)),
        }
    }
    breakdown
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinLossCounts {
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
}

pub fn win_loss_counts(trades: &[Trade]) -> WinLossCounts {
    trades.iter().fold(WinLossCounts::default(), |mut counts, trade| {
        match trade.result {
            TradeResult::Win => counts.wins += 1,
            TradeResult::Loss => counts.losses += 1,
            TradeResult::Breakeven => counts.breakevens += 1,
        }
        counts
    })
}

/// Number of days with at least `threshold` trades.
pub fn overtrading_days_in<Tz: TimeZone>(trades: &[Trade], threshold: usize, tz: &Tz) -> usize {
    daily_aggregate_in(trades, tz)
        .values()
        .filter(|day| day.trades >= threshold)
        .count()
}

pub fn overtrading_days(trades: &[Trade]) -> usize {
    overtrading_days_in(trades, OVERTRADING_THRESHOLD, &Local)
}

pub fn trades_on<'a, Tz: TimeZone>(trades: &'a [Trade], date: NaiveDate, tz: &Tz) -> Vec<&'a Trade> {
    trades.iter().filter(|t| t.date_in(tz) == date).collect()
}

pub fn today_trades(trades: &[Trade]) -> Vec<&Trade> {
    trades_on(trades, Local::now().date_naive(), &Local)
}

pub fn current_balance(trades: &[Trade], settings: &Settings) -> f64 {
    settings.balance + total_pl(trades)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::{DateTime, Utc};

    pub(crate) fn make_trade(result: TradeResult, stake: f64, payout: f64) -> Trade {
        Trade::new("EURUSD".into(), Direction::Call, result, stake, payout, Utc::now())
    }

    pub(crate) fn trade_at(result: TradeResult, pl: f64, timestamp: &str) -> Trade {
        let mut trade = make_trade(result, pl.abs().max(1.0), 85.0);
        trade.pl = pl;
        trade.timestamp = timestamp.parse::<DateTime<Utc>>().unwrap();
        trade
    }

    /// Builds storage order (newest first) from a chronological sequence.
    fn stored(chronological: Vec<Trade>) -> Vec<Trade> {
        chronological.into_iter().rev().collect()
    }

    #[test]
    fn test_empty_list_sentinels() {
        assert_eq!(total_pl(&[]), 0.0);
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(max_streak(&[], TradeResult::Win), 0);
        assert_eq!(profit_factor(&[]), ProfitFactor::Undefined);
        assert_eq!(max_drawdown(&[], 1000.0), 0.0);
        assert_eq!(best_session(&[]), None);
        assert_eq!(revenge_trade_count(&[]), 0);
    }

    #[test]
    fn test_balance_scenario() {
        // Insert WIN 100 @85 then LOSS 50, most-recent-first storage
        let trades = stored(vec![
            make_trade(TradeResult::Win, 100.0, 85.0),
            make_trade(TradeResult::Loss, 50.0, 85.0),
        ]);
        let settings = Settings::default();

        assert!((total_pl(&trades) - 35.0).abs() < 1e-9);
        assert!((current_balance(&trades, &settings) - 1035.0).abs() < 1e-9);
        assert_eq!(win_rate(&trades), 50.0);
    }

    #[test]
    fn test_win_rate_bounds_and_order_invariance() {
        let mut trades = vec![
            make_trade(TradeResult::Win, 10.0, 85.0),
            make_trade(TradeResult::Loss, 20.0, 85.0),
            make_trade(TradeResult::Breakeven, 5.0, 85.0),
            make_trade(TradeResult::Win, 40.0, 70.0),
        ];
        let rate = win_rate(&trades);
        assert!((0.0..=100.0).contains(&rate));

        let before = total_pl(&trades);
        trades.reverse();
        trades.swap(0, 2);
        assert!((total_pl(&trades) - before).abs() < 1e-9);
    }

    #[test]
    fn test_ten_win_streak_then_loss() {
        let mut trades: Vec<Trade> = (0..10).map(|_| make_trade(TradeResult::Win, 10.0, 85.0)).collect();
        assert_eq!(max_streak(&trades, TradeResult::Win), 10);

        trades.insert(0, make_trade(TradeResult::Loss, 10.0, 85.0));
        assert_eq!(max_streak(&trades, TradeResult::Win), 10);

        trades.insert(0, make_trade(TradeResult::Win, 10.0, 85.0));
        assert_eq!(max_streak(&trades, TradeResult::Win), 10);
        assert_eq!(max_streak(&trades, TradeResult::Loss), 1);
    }

    #[test]
    fn test_streak_grows_with_consecutive_matches() {
        let mut trades = vec![make_trade(TradeResult::Loss, 10.0, 85.0)];
        let mut last = 0;
        for _ in 0..4 {
            trades.push(make_trade(TradeResult::Win, 10.0, 85.0));
            let streak = max_streak(&trades, TradeResult::Win);
            assert!(streak >= last);
            last = streak;
        }
        assert_eq!(last, 4);
    }

    #[test]
    fn test_profit_factor_variants() {
        let wins_only = vec![make_trade(TradeResult::Win, 10.0, 85.0)];
        assert_eq!(profit_factor(&wins_only), ProfitFactor::Infinite);

        let mixed = vec![
            make_trade(TradeResult::Win, 100.0, 100.0),
            make_trade(TradeResult::Loss, 50.0, 85.0),
        ];
        assert_eq!(profit_factor(&mixed), ProfitFactor::Ratio(2.0));

        let flat = vec![make_trade(TradeResult::Breakeven, 10.0, 85.0)];
        assert_eq!(profit_factor(&flat), ProfitFactor::Undefined);
        assert_eq!(ProfitFactor::Infinite.to_string(), "∞");
    }

    #[test]
    fn test_max_drawdown_scenario() {
        // Chronological equity 1000 -> 1100 -> 1000 -> 1200
        let trades = stored(vec![
            trade_at(TradeResult::Win, 100.0, "2024-06-10T08:00:00Z"),
            trade_at(TradeResult::Loss, -100.0, "2024-06-10T09:00:00Z"),
            trade_at(TradeResult::Win, 200.0, "2024-06-10T10:00:00Z"),
        ]);
        assert_eq!(trades[0].pl, 200.0);

        assert_eq!(equity_curve(&trades, 1000.0), vec![1000.0, 1100.0, 1000.0, 1200.0]);
        let dd = max_drawdown(&trades, 1000.0);
        assert!((dd - 100.0 / 1100.0 * 100.0).abs() < 1e-9);
        assert!((dd - 9.09).abs() < 0.01);
    }

    #[test]
    fn test_drawdown_with_non_positive_peak() {
        let trades = stored(vec![trade_at(TradeResult::Loss, -50.0, "2024-06-10T08:00:00Z")]);
        assert_eq!(max_drawdown(&trades, 0.0), 0.0);
    }

    #[test]
    fn test_daily_aggregate_in_utc() {
        let trades = vec![
            trade_at(TradeResult::Win, 8.5, "2024-06-11T09:00:00Z"),
            trade_at(TradeResult::Loss, -10.0, "2024-06-10T23:59:00Z"),
            trade_at(TradeResult::Win, 17.0, "2024-06-10T08:00:00Z"),
        ];
        let days = daily_aggregate_in(&trades, &Utc);

        let tenth = days[&NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()];
        assert_eq!(tenth.trades, 2);
        assert_eq!(tenth.wins, 1);
        assert!((tenth.pl - 7.0).abs() < 1e-9);
        assert_eq!(tenth.win_rate(), 50.0);
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn test_revenge_trades() {
        use TradeResult::*;
        let sequence = [Loss, Loss, Win, Loss, Win, Loss, Loss, Loss, Win, Win, Loss, Loss, Breakeven, Win];
        let trades: Vec<Trade> = sequence.iter().map(|r| make_trade(*r, 10.0, 85.0)).collect();
        assert_eq!(revenge_trade_count(&trades), 2);
    }

    #[test]
    fn test_best_session() {
        let mut trades = Vec::new();
        for (session, result) in [
            ("London", TradeResult::Win),
            ("London", TradeResult::Loss),
            ("Asian", TradeResult::Win),
            ("New York", TradeResult::Win),
            ("Sydney", TradeResult::Loss),
        ] {
            let mut t = make_trade(result, 10.0, 85.0);
            t.session = session.to_string();
            trades.push(t);
        }
        // Asian and New York tie at 100%; Asian was seen first
        assert_eq!(best_session(&trades).as_deref(), Some("Asian"));

        let losers: Vec<Trade> = trades.iter().filter(|t| t.is_loss()).cloned().collect();
        assert_eq!(best_session(&losers), None);
    }

    #[test]
    fn test_asset_breakdown_first_seen_order() {
        let mut a = make_trade(TradeResult::Win, 10.0, 80.0);
        a.asset = "BTCUSD".into();
        let b = make_trade(TradeResult::Loss, 5.0, 85.0);
        let mut c = make_trade(TradeResult::Win, 10.0, 50.0);
        c.asset = "BTCUSD".into();

        let breakdown = asset_breakdown(&[a, b, c]);
        assert_eq!(breakdown, vec![("BTCUSD".to_string(), 13.0), ("EURUSD".to_string(), -5.0)]);
    }

    #[test]
    fn test_overtrading_days() {
        let mut trades: Vec<Trade> = (0..10)
            .map(|i| trade_at(TradeResult::Win, 1.0, &format!("2024-06-10T0{}:00:00Z", i % 10)))
            .collect();
        trades.push(trade_at(TradeResult::Win, 1.0, "2024-06-11T08:00:00Z"));

        assert_eq!(overtrading_days_in(&trades, OVERTRADING_THRESHOLD, &Utc), 1);
        assert_eq!(overtrading_days_in(&trades, 11, &Utc), 0);

        let day = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        assert_eq!(trades_on(&trades, day, &Utc).len(), 1);
    }

    #[test]
    fn test_win_loss_counts() {
        let trades = vec![
            make_trade(TradeResult::Win, 1.0, 85.0),
            make_trade(TradeResult::Loss, 1.0, 85.0),
            make_trade(TradeResult::Breakeven, 1.0, 85.0),
            make_trade(TradeResult::Win, 1.0, 85.0),
        ];
        assert_eq!(
            win_loss_counts(&trades),
            WinLossCounts {
                wins: 2,
                losses: 1,
                breakevens: 1
            }
        );
    }
}
