//! Argon2id password hashing for offline accounts

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{JournalError, Result};

fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(
        19456, // m_cost (19 MiB)
        2,     // t_cost
        1,     // p_cost
        None,
    )
    .map_err(|e| JournalError::Auth(format!("Invalid Argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// PHC-format hash with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| JournalError::Auth(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a wrong password, `Err` only for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| JournalError::Auth(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(JournalError::Auth(format!("Password verification failed: {}", e))),
    }
}
