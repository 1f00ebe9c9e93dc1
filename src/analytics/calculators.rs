use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthRow {
    pub day: u32,
    pub start: f64,
    pub profit: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthProjection {
    pub rows: Vec<GrowthRow>,
    pub final_balance: f64,
    pub total_profit: f64,
    pub percent_gain: f64,
}

/// Compounds `daily_percent` on `start` for `days` days.
pub fn growth_projection(start: f64, daily_percent: f64, days: u32) -> GrowthProjection {
    let rate = daily_percent / 100.0;
    let mut balance = start;
    let mut rows = Vec::with_capacity(days as usize);

    for day in 1..=days {
        let profit = balance * rate;
        rows.push(GrowthRow {
            day,
            start: balance,
            profit,
            end: balance + profit,
        });
        balance += profit;
    }

    GrowthProjection {
        rows,
        final_balance: balance,
        total_profit: balance - start,
        percent_gain: if start == 0.0 { 0.0 } else { (balance - start) / start * 100.0 },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub stake: f64,
    pub potential_profit: f64,
}

/// Stake that risks `risk_percent` of `balance`, and what a win would pay.
pub fn position_size(balance: f64, risk_percent: f64, payout: f64) -> PositionSize {
    let stake = balance * risk_percent / 100.0;
    PositionSize {
        stake,
        potential_profit: stake * payout / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_projection() {
        let projection = growth_projection(100.0, 10.0, 2);
        assert_eq!(projection.rows.len(), 2);
        assert!((projection.rows[0].end - 110.0).abs() < 1e-9);
        assert!((projection.rows[1].start - 110.0).abs() < 1e-9);
        assert!((projection.final_balance - 121.0).abs() < 1e-9);
        assert!((projection.total_profit - 21.0).abs() < 1e-9);
        assert!((projection.percent_gain - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_days() {
        let projection = growth_projection(100.0, 5.0, 0);
        assert!(projection.rows.is_empty());
        assert_eq!(projection.final_balance, 100.0);
    }

    #[test]
    fn test_position_size() {
        let size = position_size(1000.0, 2.0, 85.0);
        assert_eq!(size.stake, 20.0);
        assert_eq!(size.potential_profit, 17.0);
    }
}
