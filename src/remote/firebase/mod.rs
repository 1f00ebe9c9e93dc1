//! Firebase backend: Identity Toolkit for accounts, Firestore for data.
//!
//! Layout per user:
//! - `users/{uid}`: name, email, createdAt, settings, profile fields
//! - `users/{uid}/trades/{tradeId}`
//! - `users/{uid}/transactions/{transactionId}`
//! - `users/{uid}/journal/{YYYY-MM-DD}`
//! - `users/{uid}/data/milestones`: `values`
//! - `users/{uid}/data/progress`: `xp`, `level`, `updatedAt`

mod auth;
mod firestore;
pub mod value;

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::config::FirebaseConfig;
use crate::models::{JournalEntry, JournalMap, Settings, Trade, Transaction, UserProfile};
use crate::remote::{
    client::{ProgressSnapshot, RateLimitConfig, RemoteBackend, RemoteSession},
    error::RemoteError,
    throttle::RequestThrottle,
};

use firestore::Document;
use value::{decode_fields, encode_value, to_fields};

const AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub struct FirebaseBackend {
    api_key: String,
    project_id: String,
    auth_base: String,
    firestore_base: String,
    http_client: reqwest::Client,
    throttle: RequestThrottle,
}

#[derive(Debug, Default, Deserialize)]
struct UserDocument {
    #[serde(default)]
    settings: Option<Settings>,
}

#[derive(Debug, Default, Deserialize)]
struct MilestonesDocument {
    #[serde(default)]
    values: Vec<i64>,
}

fn user_path(uid: &str) -> String {
    format!("users/{}", uid)
}

fn timestamp_now() -> Value {
    json!({ "timestampValue": Utc::now().to_rfc3339() })
}

/// Decodes each document, skipping the ones that do not fit `T`.
/// `id_field` injects the document id into the record before decoding.
fn decode_documents<T: DeserializeOwned>(documents: &[Document], id_field: Option<&str>) -> Vec<(String, T)> {
    documents
        .iter()
        .filter_map(|doc| {
            let mut decoded = match decode_fields(&doc.fields) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Skipping remote document {}: {}", doc.id(), e);
                    return None;
                }
            };
            if let (Some(field), Some(map)) = (id_field, decoded.as_object_mut()) {
                map.insert(field.to_string(), Value::String(doc.id().to_string()));
            }
            match serde_json::from_value(decoded) {
                Ok(record) => Some((doc.id().to_string(), record)),
                Err(e) => {
                    log::warn!("Skipping remote document {}: {}", doc.id(), e);
                    None
                }
            }
        })
        .collect()
}

impl FirebaseBackend {
    pub fn new(config: &FirebaseConfig, rate_limit: RateLimitConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
            auth_base: config
                .auth_endpoint
                .clone()
                .unwrap_or_else(|| AUTH_BASE_URL.to_string()),
            firestore_base: config
                .firestore_endpoint
                .clone()
                .unwrap_or_else(|| FIRESTORE_BASE_URL.to_string()),
            http_client: reqwest::Client::new(),
            throttle: RequestThrottle::new(rate_limit),
        }
    }

    async fn get_data_document<T: DeserializeOwned>(
        &self,
        session: &RemoteSession,
        name: &str,
    ) -> Result<Option<T>, RemoteError> {
        let path = format!("{}/data/{}", user_path(&session.uid), name);
        match self.get_document(&path, &session.id_token).await? {
            Some(doc) => Ok(Some(serde_json::from_value(decode_fields(&doc.fields)?)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RemoteBackend for FirebaseBackend {
    fn backend_name(&self) -> &str {
        "firebase"
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<RemoteSession, RemoteError> {
        let mut session = self.auth_sign_up(email, password).await?;
        self.auth_set_display_name(&session.id_token, name).await?;
        session.display_name = Some(name.to_string());

        let mut fields = to_fields(&json!({
            "name": name,
            "email": email,
            "settings": Settings::default(),
        }))?;
        if let Some(map) = fields.as_object_mut() {
            map.insert("createdAt".to_string(), timestamp_now());
        }
        self.set_document(&user_path(&session.uid), &session.id_token, fields, None)
            .await?;

        log::info!("Created remote account for {}", email);
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession, RemoteError> {
        self.auth_sign_in(email, password).await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), RemoteError> {
        self.auth_send_reset(email).await
    }

    async fn update_password(&self, session: &RemoteSession, new_password: &str) -> Result<(), RemoteError> {
        self.auth_set_password(&session.id_token, new_password).await
    }

    async fn create_trade(&self, session: &RemoteSession, trade: &Trade) -> Result<(), RemoteError> {
        let path = format!("{}/trades/{}", user_path(&session.uid), trade.id);
        self.set_document(&path, &session.id_token, to_fields(trade)?, None)
            .await
    }

    async fn list_trades(&self, session: &RemoteSession) -> Result<Vec<Trade>, RemoteError> {
        let collection = format!("{}/trades", user_path(&session.uid));
        let documents = self.list_documents(&collection, &session.id_token).await?;
        let mut trades: Vec<Trade> = decode_documents(&documents, Some("id"))
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(trades)
    }

    async fn delete_trade(&self, session: &RemoteSession, id: &str) -> Result<(), RemoteError> {
        let path = format!("{}/trades/{}", user_path(&session.uid), id);
        self.delete_document(&path, &session.id_token).await
    }

    async fn create_transaction(&self, session: &RemoteSession, transaction: &Transaction) -> Result<(), RemoteError> {
        let path = format!("{}/transactions/{}", user_path(&session.uid), transaction.id);
        self.set_document(&path, &session.id_token, to_fields(transaction)?, None)
            .await
    }

    async fn list_transactions(&self, session: &RemoteSession) -> Result<Vec<Transaction>, RemoteError> {
        let collection = format!("{}/transactions", user_path(&session.uid));
        let documents = self.list_documents(&collection, &session.id_token).await?;
        let mut transactions: Vec<Transaction> = decode_documents(&documents, Some("id"))
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(transactions)
    }

    async fn upsert_journal_entry(
        &self,
        session: &RemoteSession,
        date: &str,
        entry: &JournalEntry,
    ) -> Result<(), RemoteError> {
        let path = format!("{}/journal/{}", user_path(&session.uid), date);
        self.set_document(&path, &session.id_token, to_fields(entry)?, None)
            .await
    }

    async fn delete_journal_entry(&self, session: &RemoteSession, date: &str) -> Result<(), RemoteError> {
        let path = format!("{}/journal/{}", user_path(&session.uid), date);
        self.delete_document(&path, &session.id_token).await
    }

    async fn list_journal(&self, session: &RemoteSession) -> Result<JournalMap, RemoteError> {
        let collection = format!("{}/journal", user_path(&session.uid));
        let documents = self.list_documents(&collection, &session.id_token).await?;
        Ok(decode_documents::<JournalEntry>(&documents, None)
            .into_iter()
            .map(|(date, entry)| (date, entry.normalized()))
            .collect())
    }

    async fn upsert_settings(&self, session: &RemoteSession, settings: &Settings) -> Result<(), RemoteError> {
        let fields = json!({ "settings": encode_value(&serde_json::to_value(settings)?) });
        self.set_document(&user_path(&session.uid), &session.id_token, fields, Some(&["settings"][..]))
            .await
    }

    async fn get_settings(&self, session: &RemoteSession) -> Result<Option<Settings>, RemoteError> {
        let Some(doc) = self.get_document(&user_path(&session.uid), &session.id_token).await? else {
            return Ok(None);
        };
        let user: UserDocument = serde_json::from_value(decode_fields(&doc.fields)?)?;
        Ok(user.settings)
    }

    async fn upsert_milestones(&self, session: &RemoteSession, milestones: &[i64]) -> Result<(), RemoteError> {
        let path = format!("{}/data/milestones", user_path(&session.uid));
        self.set_document(&path, &session.id_token, to_fields(&json!({ "values": milestones }))?, None)
            .await
    }

    async fn get_milestones(&self, session: &RemoteSession) -> Result<Option<Vec<i64>>, RemoteError> {
        let doc: Option<MilestonesDocument> = self.get_data_document(session, "milestones").await?;
        Ok(doc.map(|d| d.values))
    }

    async fn upsert_progress(&self, session: &RemoteSession, progress: &ProgressSnapshot) -> Result<(), RemoteError> {
        let path = format!("{}/data/progress", user_path(&session.uid));
        let mut fields = to_fields(&json!({ "xp": progress.xp, "level": progress.level }))?;
        if let Some(map) = fields.as_object_mut() {
            map.insert("updatedAt".to_string(), timestamp_now());
        }
        self.set_document(&path, &session.id_token, fields, None).await
    }

    async fn get_progress(&self, session: &RemoteSession) -> Result<Option<ProgressSnapshot>, RemoteError> {
        self.get_data_document(session, "progress").await
    }

    async fn update_profile(
        &self,
        session: &RemoteSession,
        name: &str,
        email: &str,
        profile: &UserProfile,
    ) -> Result<(), RemoteError> {
        let mut fields = to_fields(profile)?;
        if let Some(map) = fields.as_object_mut() {
            map.insert("name".to_string(), encode_value(&json!(name)));
            map.insert("email".to_string(), encode_value(&json!(email)));
            map.insert("updatedAt".to_string(), timestamp_now());
        }
        let mask: &[&str] = &["name", "email", "bio", "experience", "broker", "assets", "updatedAt"];
        self.set_document(&user_path(&session.uid), &session.id_token, fields, Some(mask))
            .await?;

        if !name.is_empty() {
            self.auth_set_display_name(&session.id_token, name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeResult;

    fn document(name: &str, fields: Value) -> Document {
        serde_json::from_value(json!({ "name": name, "fields": fields })).unwrap()
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = FirebaseConfig {
            api_key: "key".into(),
            project_id: "proj".into(),
            auth_endpoint: Some("http://localhost:9099/identitytoolkit.googleapis.com/v1".into()),
            firestore_endpoint: None,
        };
        let backend = FirebaseBackend::new(&config, RateLimitConfig::default());
        assert!(backend.auth_base.starts_with("http://localhost:9099"));
        assert_eq!(backend.firestore_base, FIRESTORE_BASE_URL);
        assert_eq!(backend.backend_name(), "firebase");
    }

    #[test]
    fn test_trade_documents_take_their_id_from_the_path() {
        let docs = vec![
            document(
                "projects/p/databases/(default)/documents/users/u/trades/TRADE-1",
                json!({
                    "asset": { "stringValue": "EURUSD" },
                    "direction": { "stringValue": "CALL" },
                    "result": { "stringValue": "WIN" },
                    "stake": { "integerValue": "10" },
                    "payout": { "integerValue": "85" },
                    "pl": { "doubleValue": 8.5 },
                    "timestamp": { "stringValue": "2024-06-10T08:00:00Z" }
                }),
            ),
            document(
                "projects/p/databases/(default)/documents/users/u/trades/broken",
                json!({ "asset": { "stringValue": "GOLD" } }),
            ),
        ];

        let trades: Vec<(String, Trade)> = decode_documents(&docs, Some("id"));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].1.id, "TRADE-1");
        assert_eq!(trades[0].1.result, TradeResult::Win);
        assert_eq!(trades[0].1.stake, 10.0);
    }

    #[test]
    fn test_journal_documents_keyed_by_date() {
        let docs = vec![document(
            "projects/p/databases/(default)/documents/users/u/journal/2024-06-10",
            json!({ "pre": { "stringValue": "calm" }, "mood": { "integerValue": "4" } }),
        )];
        let entries: Vec<(String, JournalEntry)> = decode_documents(&docs, None);
        assert_eq!(entries[0].0, "2024-06-10");
        assert_eq!(entries[0].1.mood, 4);
        assert_eq!(entries[0].1.discipline, 5);
    }

    #[test]
    fn test_user_document_without_settings() {
        let decoded = decode_fields(&json!({ "name": { "stringValue": "Sam" } })).unwrap();
        let user: UserDocument = serde_json::from_value(decoded).unwrap();
        assert!(user.settings.is_none());
    }
}
