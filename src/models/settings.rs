use serde::{Deserialize, Serialize};

pub const DEFAULT_MILESTONES: [i64; 5] = [100, 500, 1000, 5000, 10000];

fn default_balance() -> f64 {
    1000.0
}
fn default_tp() -> f64 {
    5.0
}
fn default_sl() -> f64 {
    3.0
}

/// Account settings: starting balance plus daily take-profit / stop-loss percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_balance")]
    pub balance: f64,
    #[serde(default = "default_tp")]
    pub tp: f64,
    #[serde(default = "default_sl")]
    pub sl: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            balance: default_balance(),
            tp: default_tp(),
            sl: default_sl(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}
