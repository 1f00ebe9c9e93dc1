use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "de::id_string")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    pub amount: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTransactionInput {
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionType>,
    pub amount: Option<f64>,
    pub note: Option<String>,
}

impl Transaction {
    pub fn new(kind: TransactionType, amount: f64, note: String, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("TXN-{}-{}", now.timestamp_millis(), uuid::Uuid::new_v4()),
            kind,
            amount,
            note,
            timestamp: now,
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == TransactionType::Withdrawal
    }
}
