//! Process configuration read from the environment (and `.env`, when present).

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    pub storage_root: PathBuf,
    pub max_upload_bytes: usize,
    pub public_base_url: String,
    pub invitation_ttl_hours: i64,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let session_secret = lookup("SESSION_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?;

        Ok(Self {
            database_url: get("DATABASE_URL", "sqlite://cleanops.db?mode=rwc"),
            bind_addr: parse("BIND_ADDR", get("BIND_ADDR", "127.0.0.1:3000"))?,
            session_secret,
            storage_root: PathBuf::from(get("STORAGE_ROOT", "./storage")),
            max_upload_bytes: parse("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES", "10485760"))?,
            public_base_url: get("PUBLIC_BASE_URL", "http://localhost:3000"),
            invitation_ttl_hours: parse("INVITATION_TTL_HOURS", get("INVITATION_TTL_HOURS", "168"))?,
            session_ttl_hours: parse("SESSION_TTL_HOURS", get("SESSION_TTL_HOURS", "12"))?,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
