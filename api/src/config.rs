use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::entities::User;

const DEV_ACCESS_SECRET: &str = "dev-access-secret-not-for-production";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-not-for-production";
const DEV_CRYPTO_KEY: &str = "dev-key-not-for-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// HS256 secret for access tokens
    pub jwt_access_secret: String,
    /// HS256 secret for refresh tokens
    pub jwt_refresh_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// Key for credential fingerprints embedded in tokens
    pub crypto_key: String,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub log_dir: PathBuf,
    pub mail_from: String,
    /// Where the housekeeping job sends the server log. Unset disables shipping.
    pub log_recipient: Option<String>,
    pub mail_outbox_dir: PathBuf,
    pub default_admin_email: String,
    pub default_admin_name: String,
    pub default_admin_password: Option<String>,
    pub housekeeping_interval_secs: u64,
    pub login_rate_limit: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            port: parse_or("PORT", 8080)?,
            jwt_access_secret: env::var("JWT_ACCESS_SECRET")
                .unwrap_or_else(|_| DEV_ACCESS_SECRET.to_string()),
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| DEV_REFRESH_SECRET.to_string()),
            access_token_ttl_secs: parse_or("ACCESS_TOKEN_TTL_SECS", 3600)?,
            refresh_token_ttl_secs: parse_or("REFRESH_TOKEN_TTL_SECS", 7 * 24 * 3600)?,
            crypto_key: env::var("CRYPTO_KEY").unwrap_or_else(|_| DEV_CRYPTO_KEY.to_string()),
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            log_dir: env::var("LOG_DIR")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
            log_recipient: env::var("LOG_RECIPIENT").ok().filter(|s| !s.is_empty()),
            mail_outbox_dir: env::var("MAIL_OUTBOX_DIR")
                .unwrap_or_else(|_| "outbox".to_string())
                .into(),
            default_admin_email: env::var("DEFAULT_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@localhost".to_string()),
            default_admin_name: env::var("DEFAULT_ADMIN_NAME")
                .unwrap_or_else(|_| "Administrator".to_string()),
            default_admin_password: env::var("DEFAULT_ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
            housekeeping_interval_secs: parse_or("HOUSEKEEPING_INTERVAL_SECS", 3600)?,
            login_rate_limit: parse_or("LOGIN_RATE_LIMIT", true)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not fit a single variable parse
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.default_admin_name.trim();
        if name.is_empty() || name.chars().count() > User::NAME_MAX {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_ADMIN_NAME",
                value: self.default_admin_name.clone(),
            });
        }
        Ok(())
    }

    /// Names of secrets still set to their development defaults
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        let mut insecure = Vec::new();
        if self.jwt_access_secret == DEV_ACCESS_SECRET {
            insecure.push("JWT_ACCESS_SECRET");
        }
        if self.jwt_refresh_secret == DEV_REFRESH_SECRET {
            insecure.push("JWT_REFRESH_SECRET");
        }
        if self.crypto_key == DEV_CRYPTO_KEY {
            insecure.push("CRYPTO_KEY");
        }
        insecure
    }

    /// Path of the server log file written by the file logging layer
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(crate::logging::LOG_FILE_NAME)
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/campus_test".to_string(),
        port: 0,
        jwt_access_secret: "test-access-secret".to_string(),
        jwt_refresh_secret: "test-refresh-secret".to_string(),
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 7 * 24 * 3600,
        crypto_key: "test-crypto-key".to_string(),
        bcrypt_cost: 4,
        upload_dir: std::env::temp_dir().join("campus-api-test-uploads"),
        max_upload_bytes: 1024 * 1024,
        log_dir: std::env::temp_dir().join("campus-api-test-logs"),
        mail_from: "no-reply@school.test".to_string(),
        log_recipient: None,
        mail_outbox_dir: std::env::temp_dir().join("campus-api-test-outbox"),
        default_admin_email: "admin@school.test".to_string(),
        default_admin_name: "Administrator".to_string(),
        default_admin_password: Some("admin-password".to_string()),
        housekeeping_interval_secs: 3600,
        login_rate_limit: false,
    }
}
