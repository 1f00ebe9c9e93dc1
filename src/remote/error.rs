use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid backend response: {0}")]
    Parse(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Remote backend not configured")]
    NotConfigured,
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Parse(err.to_string())
    }
}

impl RemoteError {
    /// Builds an authentication error from an identity-provider error code,
    /// e.g. `"INVALID_PASSWORD"` or `"WEAK_PASSWORD : Password should be ..."`.
    pub fn from_auth_code(raw: &str) -> Self {
        RemoteError::Authentication(auth_message(raw).to_string())
    }
}

/// User-facing message for an identity-provider error code.
/// Unknown codes are passed through untouched.
pub fn auth_message(raw: &str) -> &str {
    let code = raw.split_whitespace().next().unwrap_or(raw);
    match code {
        "EMAIL_EXISTS" => "This email is already registered",
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "Incorrect password",
        "EMAIL_NOT_FOUND" => "No account found with this email",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Try again later",
        "WEAK_PASSWORD" => "Password should be at least 6 characters",
        "INVALID_EMAIL" => "Invalid email address",
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => "Please login again to continue",
        _ => raw,
    }
}
