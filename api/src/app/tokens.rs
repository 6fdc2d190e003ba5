//! JWT issuance and validation
//!
//! Access and refresh tokens are HS256 JWTs signed with separate secrets.
//! Each token carries the user's credential fingerprint; see
//! `password::credential_fingerprint`.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::entities::{Role, User};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub kind: TokenKind,
    /// Credential fingerprint at issue time
    pub fp: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("wrong token kind")]
    WrongKind,
}

impl From<TokenError> for DomainError {
    fn from(e: TokenError) -> Self {
        DomainError::Unauthorized(e.to_string())
    }
}

/// Signing material and lifetimes for both token kinds
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_access_secret,
            &config.jwt_refresh_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        )
    }

    pub fn ttl_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    fn encoding(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }
}

/// Sign a token of `kind` for `user`
pub fn create_authentication_token(
    keys: &TokenKeys,
    user: &User,
    kind: TokenKind,
    fingerprint: &str,
) -> Result<String, DomainError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.0,
        role: user.role,
        kind,
        fp: fingerprint.to_string(),
        iat: now,
        exp: now + keys.ttl_secs(kind),
    };

    encode(&Header::new(Algorithm::HS256), &claims, keys.encoding(kind))
        .map_err(|e| DomainError::Internal(format!("Failed to sign token: {}", e)))
}

/// Check signature, expiry and kind; return the claims
pub fn validate_token(keys: &TokenKeys, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(token, keys.decoding(kind), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?
        .claims;

    if claims.kind != kind {
        return Err(TokenError::WrongKind);
    }

    Ok(claims)
}
