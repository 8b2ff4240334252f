//! Process configuration read from the environment (after `.env` is loaded).

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PAYMENT_BASE_URL: &str = "https://app.sandbox.midtrans.com/snap/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub port: u16,
    pub auth_secret: String,
    pub token_ttl_hours: i64,
    pub payment: PaymentConfig,
    pub upload_dir: PathBuf,
    pub nats_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub server_key: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let auth_secret = required("AUTH_SECRET")?;
        if auth_secret.len() < 16 {
            return Err(ConfigError::Invalid { key: "AUTH_SECRET", value: "<at least 16 characters required>".into() });
        }

        Ok(Self {
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
            port: parse_or(get("PORT"), "PORT", 8083)?,
            auth_secret,
            token_ttl_hours: parse_or(get("TOKEN_TTL_HOURS"), "TOKEN_TTL_HOURS", 168)?,
            payment: PaymentConfig {
                server_key: required("PAYMENT_SERVER_KEY")?,
                base_url: get("PAYMENT_BASE_URL").unwrap_or_else(|| DEFAULT_PAYMENT_BASE_URL.to_string()),
            },
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./uploads")),
            nats_url: get("NATS_URL"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}
