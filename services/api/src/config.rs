//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the scheduler's key-value data is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// A JSON file on disk.
    File(PathBuf),
    /// A key-value table in PostgreSQL.
    Postgres { database_url: String },
    /// Process memory; lost on restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub backend_url: String,
    pub backend_token: Option<String>,
    pub backend_timeout: Option<Duration>,
    pub storage: StorageBackend,
    pub cors_origin: String,
    pub auto_check_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Expense Backend ---
        let backend_url = lookup("BACKEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| ConfigError::MissingVar("BACKEND_URL".to_string()))?;
        let backend_token = lookup("BACKEND_TOKEN").filter(|t| !t.is_empty());
        let backend_timeout = lookup("BACKEND_TIMEOUT_SECS")
            .map(|raw| parse_u64("BACKEND_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        // --- Storage ---
        let storage_kind = lookup("STORAGE_BACKEND").unwrap_or_else(|| "file".to_string());
        let storage = match storage_kind.to_lowercase().as_str() {
            "file" => StorageBackend::File(
                lookup("STORAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/storage.json")),
            ),
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of file, postgres, memory", other),
                ))
            }
        };

        let auto_check_delay = lookup("AUTO_CHECK_DELAY_MS")
            .map(|raw| parse_u64("AUTO_CHECK_DELAY_MS", &raw))
            .transpose()?
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1500));

        Ok(Self {
            bind_address,
            log_level,
            backend_url,
            backend_token,
            backend_timeout,
            storage,
            cors_origin,
            auto_check_delay,
        })
    }
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
