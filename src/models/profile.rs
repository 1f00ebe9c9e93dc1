use serde::{Deserialize, Serialize};

/// Free-form profile details shown next to the identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub broker: String,
    #[serde(default)]
    pub assets: String,
}

fn default_goal_win_rate() -> f64 {
    65.0
}
fn default_goal_max_trades() -> u32 {
    10
}
fn default_goal_trading_days() -> u32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingGoals {
    #[serde(default)]
    pub monthly_profit: f64,
    #[serde(default = "default_goal_win_rate")]
    pub win_rate: f64,
    #[serde(default = "default_goal_max_trades")]
    pub max_trades: u32, // per day
    #[serde(default = "default_goal_trading_days")]
    pub trading_days: u32, // per month
}

impl Default for TradingGoals {
    fn default() -> Self {
        Self {
            monthly_profit: 0.0,
            win_rate: default_goal_win_rate(),
            max_trades: default_goal_max_trades(),
            trading_days: default_goal_trading_days(),
        }
    }
}
