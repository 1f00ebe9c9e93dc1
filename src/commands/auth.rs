//! Sign-up, login and account lifecycle, against the remote identity
//! provider when one is configured and against local storage otherwise.

use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::error::{JournalError, Result, ValidationError};
use crate::models::{IdentityProvider, UserIdentity};
use crate::remote::{RemoteBackend, RemoteError};
use crate::security::{hash_password, verify_password};
use crate::state::Journal;

pub const SIGNUP_MIN_PASSWORD: usize = 6;
pub const CHANGE_MIN_PASSWORD: usize = 8;

static EMAIL_SHAPE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

pub(crate) fn validate_email(email: &str) -> Result<()> {
    let re = EMAIL_SHAPE
        .as_ref()
        .map_err(|e| JournalError::Config(e.to_string()))?;
    if re.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()).into())
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_new_password(password: &str, confirm: &str, min: usize) -> Result<()> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch.into());
    }
    if password.chars().count() < min {
        return Err(ValidationError::PasswordTooShort { min }.into());
    }
    Ok(())
}

impl Journal {
    fn backend(&self) -> Option<Arc<dyn RemoteBackend>> {
        self.remote.as_ref().map(|r| Arc::clone(r.backend()))
    }

    fn set_current_user(&mut self, user: UserIdentity) -> Result<UserIdentity> {
        self.persistence.save_current_user(Some(&user))?;
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Forgets every local key except offline credentials and returns to a
    /// fresh, signed-out session.
    fn wipe_local(&mut self) -> Result<()> {
        self.persistence.clear_keeping_accounts()?;
        self.session = None;
        self.reload();
        Ok(())
    }

    pub async fn sign_up(&mut self, name: &str, email: &str, password: &str, confirm: &str) -> Result<UserIdentity> {
        let email = email.trim();
        validate_email(email)?;
        check_new_password(password, confirm, SIGNUP_MIN_PASSWORD)?;
        let name = match name.trim() {
            "" => UserIdentity::name_from_email(email),
            n => n.to_string(),
        };

        let user = match self.backend() {
            Some(backend) => {
                let session = backend.sign_up(&name, email, password).await?;
                let mut user = UserIdentity::local(&name, email);
                user.uid = Some(session.uid.clone());
                user.provider = Some(backend.backend_name().to_string());
                self.session = Some(session);
                user
            }
            None => {
                let mut accounts = self.persistence.load_local_accounts();
                let key = account_key(email);
                if accounts.contains_key(&key) {
                    return Err(JournalError::Auth("This email is already registered".to_string()));
                }
                accounts.insert(key, hash_password(password)?);
                self.persistence.save_local_accounts(&accounts)?;

                let mut user = UserIdentity::local(&name, email);
                user.uid = Some(format!("local_{}", Utc::now().timestamp_millis()));
                user
            }
        };

        log::info!("Account created for {}", email);
        self.set_current_user(user)
    }

    /// Signs in. With a remote backend the cloud copy is pulled afterwards;
    /// a failed pull is logged and the local data kept.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserIdentity> {
        let email = email.trim();
        validate_email(email)?;

        let Some(backend) = self.backend() else {
            return self.login_offline(email, password);
        };

        let session = backend.sign_in(email, password).await?;
        let name = session
            .display_name
            .clone()
            .unwrap_or_else(|| UserIdentity::name_from_email(email));
        let mut user = UserIdentity::local(&name, email);
        user.uid = Some(session.uid.clone());
        user.provider = Some(backend.backend_name().to_string());
        self.session = Some(session);
        let user = self.set_current_user(user)?;

        if let Err(e) = self.load_from_cloud().await {
            log::error!("Error loading data from cloud: {}", e);
        }
        log::info!("Signed in as {}", email);
        Ok(user)
    }

    /// A known offline account must match its stored hash. An unknown email
    /// is registered on the spot with a local identity named after it.
    fn login_offline(&mut self, email: &str, password: &str) -> Result<UserIdentity> {
        let key = account_key(email);
        let mut accounts = self.persistence.load_local_accounts();
        match accounts.get(&key) {
            Some(hash) => {
                if !verify_password(password, hash)? {
                    return Err(JournalError::Auth("Incorrect password".to_string()));
                }
            }
            None => {
                accounts.insert(key.clone(), hash_password(password)?);
                self.persistence.save_local_accounts(&accounts)?;
            }
        }

        let user = match self.current_user.as_ref().filter(|u| account_key(&u.email) == key) {
            Some(existing) => existing.clone(),
            None => {
                let mut user = UserIdentity::local(&UserIdentity::name_from_email(email), email);
                user.uid = Some(format!("local_{}", Utc::now().timestamp_millis()));
                user
            }
        };
        log::info!("Logged in as {} (offline mode)", email);
        self.set_current_user(user)
    }

    /// Provider sign-in needs a browser popup, so only the offline demo
    /// identity is available here.
    pub fn login_with_provider(&mut self, provider: IdentityProvider) -> Result<UserIdentity> {
        if self.remote.is_some() {
            return Err(JournalError::Auth(format!(
                "{} sign-in is not available here; use email and password",
                provider.label()
            )));
        }
        let user = provider.demo_identity();
        log::info!("Logged in with {} (demo mode)", provider.label());
        self.set_current_user(user)
    }

    /// Cloud sessions drop every local key; offline sessions only forget the user.
    pub fn logout(&mut self) -> Result<()> {
        if self.session.is_some() {
            self.wipe_local()?;
        } else {
            self.persistence.save_current_user(None)?;
            self.current_user = None;
        }
        log::info!("Logged out");
        Ok(())
    }

    pub async fn change_password(&mut self, current: &str, new: &str, confirm: &str) -> Result<()> {
        let Some(user) = self.current_user.clone() else {
            return Err(JournalError::Auth("Please login first".to_string()));
        };
        check_new_password(new, confirm, CHANGE_MIN_PASSWORD)?;

        match (self.backend(), self.session.is_some()) {
            (Some(backend), true) => {
                let session = backend.sign_in(&user.email, current).await?;
                backend.update_password(&session, new).await?;
                self.session = Some(session);
            }
            _ => {
                let key = account_key(&user.email);
                let mut accounts = self.persistence.load_local_accounts();
                if let Some(hash) = accounts.get(&key) {
                    if !verify_password(current, hash)? {
                        return Err(JournalError::Auth("Incorrect password".to_string()));
                    }
                }
                accounts.insert(key, hash_password(new)?);
                self.persistence.save_local_accounts(&accounts)?;
            }
        }

        log::info!("Password updated");
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        let Some(backend) = self.backend() else {
            return Err(JournalError::Auth(
                "Password reset not available in offline mode".to_string(),
            ));
        };
        let email = email.trim();
        validate_email(email)?;
        backend.send_password_reset(email).await?;
        log::info!("Password reset email sent to {}", email);
        Ok(())
    }

    /// Removes every local key and the signed-in user's offline credentials.
    /// Other offline accounts and remote data are left in place.
    pub fn delete_account(&mut self) -> Result<()> {
        if let Some(user) = &self.current_user {
            let mut accounts = self.persistence.load_local_accounts();
            if accounts.remove(&account_key(&user.email)).is_some() {
                self.persistence.save_local_accounts(&accounts)?;
            }
        }
        self.wipe_local()?;
        log::info!("Account deleted");
        Ok(())
    }

    pub(crate) fn require_session(&self) -> std::result::Result<(), RemoteError> {
        match (&self.remote, &self.session) {
            (None, _) => Err(RemoteError::NotConfigured),
            (Some(_), None) => Err(RemoteError::NotSignedIn),
            _ => Ok(()),
        }
    }
}
