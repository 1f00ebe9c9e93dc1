//! Identity Toolkit REST calls (email/password accounts).

use serde::Deserialize;
use serde_json::{json, Value};

use super::FirebaseBackend;
use crate::remote::client::RemoteSession;
use crate::remote::error::RemoteError;

const SIGN_UP: &str = "accounts:signUp";
const SIGN_IN: &str = "accounts:signInWithPassword";
const SEND_OOB_CODE: &str = "accounts:sendOobCode";
const UPDATE: &str = "accounts:update";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl AuthResponse {
    fn into_session(self, fallback_email: &str) -> RemoteSession {
        let email = if self.email.is_empty() {
            fallback_email.to_string()
        } else {
            self.email
        };
        RemoteSession {
            uid: self.local_id,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            email,
            display_name: self.display_name.filter(|n| !n.is_empty()),
        }
    }
}

/// Pulls the error code out of an Identity Toolkit error body,
/// `{"error": {"message": "CODE : detail"}}`.
pub(super) fn error_code(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?;
    message.split_whitespace().next().map(str::to_string)
}

impl FirebaseBackend {
    async fn identity_call(&self, method: &str, body: Value) -> Result<Value, RemoteError> {
        self.throttle.wait().await;

        let url = format!("{}/{}?key={}", self.auth_base, method, self.api_key);
        let response = self.http_client.post(&url).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if status.as_u16() == 429 {
            return Err(RemoteError::RateLimit(
                "Too many attempts. Try again later".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(match error_code(&text) {
                Some(code) => RemoteError::from_auth_code(&code),
                None => RemoteError::Backend {
                    status: status.as_u16(),
                    message: text,
                },
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| RemoteError::Parse(format!("Failed to parse auth response: {} - Body: {}", e, text)))
    }

    pub(super) async fn auth_sign_up(&self, email: &str, password: &str) -> Result<RemoteSession, RemoteError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response: AuthResponse = serde_json::from_value(self.identity_call(SIGN_UP, body).await?)?;
        Ok(response.into_session(email))
    }

    pub(super) async fn auth_sign_in(&self, email: &str, password: &str) -> Result<RemoteSession, RemoteError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response: AuthResponse = serde_json::from_value(self.identity_call(SIGN_IN, body).await?)?;
        Ok(response.into_session(email))
    }

    pub(super) async fn auth_set_display_name(&self, id_token: &str, name: &str) -> Result<(), RemoteError> {
        let body = json!({ "idToken": id_token, "displayName": name, "returnSecureToken": false });
        self.identity_call(UPDATE, body).await?;
        Ok(())
    }

    pub(super) async fn auth_set_password(&self, id_token: &str, password: &str) -> Result<(), RemoteError> {
        let body = json!({ "idToken": id_token, "password": password, "returnSecureToken": true });
        self.identity_call(UPDATE, body).await?;
        Ok(())
    }

    pub(super) async fn auth_send_reset(&self, email: &str) -> Result<(), RemoteError> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        self.identity_call(SEND_OOB_CODE, body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_extraction() {
        let body = r#"{"error":{"code":400,"message":"WEAK_PASSWORD : Password should be at least 6 characters"}}"#;
        assert_eq!(error_code(body).as_deref(), Some("WEAK_PASSWORD"));
        assert_eq!(error_code(r#"{"error":{"message":"EMAIL_EXISTS"}}"#).as_deref(), Some("EMAIL_EXISTS"));
        assert_eq!(error_code("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_auth_response_to_session() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"idToken":"tok","refreshToken":"ref","localId":"uid-1","email":"a@b.io","displayName":""}"#,
        )
        .unwrap();
        let session = response.into_session("ignored@b.io");
        assert_eq!(session.uid, "uid-1");
        assert_eq!(session.email, "a@b.io");
        assert_eq!(session.display_name, None);
    }
}
