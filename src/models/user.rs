use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in identity. `uid` is only present for cloud accounts. Offline
/// credentials live apart from it, under their own storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Third-party sign-in providers. Without a browser popup flow they only
/// produce a local demo identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    Google,
    GitHub,
}

impl IdentityProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GitHub => "github",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::GitHub => "GitHub",
        }
    }

    pub fn demo_identity(self) -> UserIdentity {
        let (email, pic) = match self {
            Self::Google => (
                "demo@gmail.com",
                "https://ui-avatars.com/api/?name=G&background=ea4335&color=fff",
            ),
            Self::GitHub => (
                "demo@github.com",
                "https://ui-avatars.com/api/?name=GH&background=333&color=fff",
            ),
        };
        let mut user = UserIdentity::local(&format!("{} User", self.label()), email);
        user.uid = Some(format!("local_{}_{}", self.as_str(), Utc::now().timestamp_millis()));
        user.pic = Some(pic.to_string());
        user.provider = Some(self.as_str().to_string());
        user
    }
}

impl UserIdentity {
    pub fn local(name: &str, email: &str) -> Self {
        Self {
            uid: None,
            name: name.to_string(),
            email: email.to_string(),
            pic: None,
            provider: None,
            created_at: Utc::now(),
        }
    }

    /// Display name derived from the mailbox part of an email.
    pub fn name_from_email(email: &str) -> String {
        email.split('@').next().unwrap_or(email).to_string()
    }

    /// Up to two uppercase initials, e.g. "Jane Q Doe" -> "JQ".
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}
