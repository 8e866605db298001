//! Password hashing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashFailed(String),

    #[error("Password worker failed: {0}")]
    WorkerFailed(String),
}

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Check a password against a stored bcrypt hash.
///
/// A malformed hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// `hash_password` on the blocking pool; bcrypt is deliberately slow
pub async fn hash_password_off_thread(password: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| PasswordError::WorkerFailed(e.to_string()))?
}

/// `verify_password` on the blocking pool
pub async fn verify_password_off_thread(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::WorkerFailed(e.to_string()))
}
