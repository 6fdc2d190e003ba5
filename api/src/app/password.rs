//! Password hashing and credential fingerprints

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::DomainError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

type HmacSha256 = Hmac<Sha256>;

/// Hash a password with bcrypt on a blocking thread
pub async fn hash_password(plain: &str, cost: u32) -> Result<String, DomainError> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| DomainError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| DomainError::Internal(format!("bcrypt error: {}", e)))
}

/// Check a password against a bcrypt hash on a blocking thread.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, DomainError> {
    let plain = plain.to_string();
    let hash = hash.to_string();
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| DomainError::Internal(format!("Verification task failed: {}", e)))?;

    match result {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            Ok(false)
        }
    }
}

pub fn check_password_strength(plain: &str) -> Result<(), DomainError> {
    let len = plain.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(DomainError::Validation(format!(
            "password: must be between {} and {} characters",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Short keyed digest of a stored password hash.
///
/// Embedded in tokens so that changing a password revokes every token issued
/// before the change.
pub fn credential_fingerprint(crypto_key: &str, password_hash: &str) -> Result<String, DomainError> {
    let mut mac = HmacSha256::new_from_slice(crypto_key.as_bytes())
        .map_err(|_| DomainError::Internal("Invalid crypto key".to_string()))?;
    mac.update(password_hash.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(digest[..16].to_string())
}
