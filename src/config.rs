use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{JournalError, Result};
use crate::remote::RateLimitConfig;

const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_database_file() -> String {
    "tradeedge.db".to_string()
}
fn default_requests_per_second() -> u32 {
    5
}
fn default_burst_size() -> u32 {
    10
}

/// Firebase project credentials. Endpoint overrides point at an emulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    #[serde(default)]
    pub auth_endpoint: Option<String>,
    #[serde(default)]
    pub firestore_endpoint: Option<String>,
}

impl FirebaseConfig {
    /// False for an empty or placeholder API key.
    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY && !self.project_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            firebase: None,
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            JournalError::Config(format!("Could not read config file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| JournalError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Reads `TRADEEDGE_DATA_DIR`, `TRADEEDGE_FIREBASE_API_KEY` and
    /// `TRADEEDGE_FIREBASE_PROJECT_ID`; anything unset keeps its default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var("TRADEEDGE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let (Ok(api_key), Ok(project_id)) = (
            env::var("TRADEEDGE_FIREBASE_API_KEY"),
            env::var("TRADEEDGE_FIREBASE_PROJECT_ID"),
        ) {
            config.firebase = Some(FirebaseConfig {
                api_key,
                project_id,
                auth_endpoint: None,
                firestore_endpoint: None,
            });
        }
        config
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Firebase settings, only when they point at a real project.
    pub fn remote(&self) -> Option<&FirebaseConfig> {
        self.firebase.as_ref().filter(|f| f.is_configured())
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: self.requests_per_second,
            burst_size: self.burst_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_file_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/tmp/te", "firebase": {{"api_key": "abc", "project_id": "proj"}}}}"#)
            .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/te/tradeedge.db"));
        assert_eq!(config.requests_per_second, 5);
        assert!(config.remote().is_some());
    }

    #[test]
    fn test_placeholder_key_is_local_only() {
        let config = AppConfig {
            firebase: Some(FirebaseConfig {
                api_key: "YOUR_API_KEY".into(),
                project_id: "proj".into(),
                auth_endpoint: None,
                firestore_endpoint: None,
            }),
            ..Default::default()
        };
        assert!(config.remote().is_none());
        assert!(AppConfig::default().remote().is_none());
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(AppConfig::from_file(file.path()), Err(JournalError::Config(_))));
        assert!(matches!(AppConfig::from_file("/nonexistent/te.json"), Err(JournalError::Config(_))));
    }
}
