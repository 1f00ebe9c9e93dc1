use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::de;

pub const DEFAULT_PAYOUT: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "PUT")]
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeResult {
    #[serde(rename = "WIN")]
    Win,
    #[serde(rename = "LOSS")]
    Loss,
    /// Anything that is neither a win nor a loss (draws, refunds, legacy labels).
    #[serde(rename = "BREAKEVEN")]
    #[serde(other)]
    Breakeven,
}

impl TradeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeResult::Win => "WIN",
            TradeResult::Loss => "LOSS",
            TradeResult::Breakeven => "BREAKEVEN",
        }
    }
}

/// Realized P/L for an outcome. Only ever called at construction time.
pub fn compute_pl(result: TradeResult, stake: f64, payout: f64) -> f64 {
    match result {
        TradeResult::Win => stake * (payout / 100.0),
        TradeResult::Loss => -stake,
        TradeResult::Breakeven => 0.0,
    }
}

fn default_payout() -> f64 {
    DEFAULT_PAYOUT
}
fn default_expiry() -> String {
    "1m".to_string()
}
fn default_session() -> String {
    "London".to_string()
}
fn default_strategy() -> String {
    "Support/Resistance".to_string()
}
fn default_setup_rating() -> u8 {
    3
}
fn default_confidence() -> u8 {
    5
}
fn default_emotion_before() -> String {
    "calm".to_string()
}
fn default_emotion_after() -> String {
    "satisfied".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(deserialize_with = "de::id_string")]
    pub id: String,
    pub asset: String,
    pub direction: Direction,
    pub result: TradeResult,
    pub stake: f64,
    #[serde(default = "default_payout")]
    pub payout: f64,
    pub pl: f64,

    #[serde(default = "default_expiry")]
    pub expiry: String,
    #[serde(default = "default_session")]
    pub session: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub entry_price: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub martingale: u32,
    #[serde(default = "default_setup_rating", deserialize_with = "de::lenient")]
    pub setup_rating: u8,
    #[serde(default = "default_confidence", deserialize_with = "de::lenient")]
    pub confidence: u8,
    #[serde(default = "default_emotion_before")]
    pub emotion_before: String,
    #[serde(default = "default_emotion_after")]
    pub emotion_after: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>, // data URL

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Form input for a new trade. Missing selections stay `None` so the
/// caller can report which field was left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTradeInput {
    pub asset: Option<String>,
    pub direction: Option<Direction>,
    pub result: Option<TradeResult>,
    pub stake: Option<f64>,
    pub payout: Option<f64>,
    pub expiry: Option<String>,
    pub session: Option<String>,
    pub strategy: Option<String>,
    pub entry_price: Option<String>,
    pub martingale: Option<u32>,
    pub setup_rating: Option<u8>,
    pub confidence: Option<u8>,
    pub emotion_before: Option<String>,
    pub emotion_after: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub screenshot: Option<Screenshot>,
}

/// Raw image attached to a trade form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Screenshot {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        let bytes = BASE64.decode(payload).ok()?;
        Some(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

pub fn generate_trade_id(now: DateTime<Utc>) -> String {
    format!("TRADE-{}-{}", now.timestamp_millis(), uuid::Uuid::new_v4())
}

impl Trade {
    /// Builds a trade from already-validated parts, co-assigning `pl`.
    pub fn new(
        asset: String,
        direction: Direction,
        result: TradeResult,
        stake: f64,
        payout: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_trade_id(now),
            asset,
            direction,
            result,
            stake,
            payout,
            pl: compute_pl(result, stake, payout),
            expiry: default_expiry(),
            session: default_session(),
            strategy: default_strategy(),
            entry_price: String::new(),
            martingale: 0,
            setup_rating: default_setup_rating(),
            confidence: default_confidence(),
            emotion_before: default_emotion_before(),
            emotion_after: default_emotion_after(),
            notes: String::new(),
            tags: String::new(),
            screenshot: None,
            timestamp: now,
        }
    }

    /// Copies optional form metadata over the defaults.
    pub fn with_metadata(mut self, input: &CreateTradeInput) -> Self {
        if let Some(v) = non_empty(&input.expiry) {
            self.expiry = v;
        }
        if let Some(v) = non_empty(&input.session) {
            self.session = v;
        }
        if let Some(v) = non_empty(&input.strategy) {
            self.strategy = v;
        }
        if let Some(v) = &input.entry_price {
            self.entry_price = v.clone();
        }
        if let Some(v) = input.martingale {
            self.martingale = v;
        }
        if let Some(v) = input.setup_rating {
            self.setup_rating = v.clamp(1, 5);
        }
        if let Some(v) = input.confidence {
            self.confidence = v.clamp(1, 10);
        }
        if let Some(v) = non_empty(&input.emotion_before) {
            self.emotion_before = v;
        }
        if let Some(v) = non_empty(&input.emotion_after) {
            self.emotion_after = v;
        }
        if let Some(v) = &input.notes {
            self.notes = v.clone();
        }
        if let Some(v) = &input.tags {
            self.tags = v.clone();
        }
        self.screenshot = input.screenshot.as_ref().map(Screenshot::to_data_url);
        self
    }

    /// False when `pl` no longer matches `result/stake/payout`
    /// (for example after a hand-edited import).
    pub fn pl_is_consistent(&self) -> bool {
        (compute_pl(self.result, self.stake, self.payout) - self.pl).abs() < 1e-6
    }

    pub fn is_win(&self) -> bool {
        self.result == TradeResult::Win
    }

    pub fn is_loss(&self) -> bool {
        self.result == TradeResult::Loss
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Calendar date of the trade in the given timezone.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.timestamp.with_timezone(tz).date_naive()
    }

    pub fn screenshot(&self) -> Option<Screenshot> {
        self.screenshot.as_deref().and_then(Screenshot::from_data_url)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
