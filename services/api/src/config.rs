//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use school_office_core::errors::RetryPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the persisted collections live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    /// One JSON file per collection inside the directory.
    File(PathBuf),
    /// A key-value table in PostgreSQL, reached through the URL.
    Postgres(String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage: StorageBackend,
    pub cors_origin: String,
    pub retry: RetryPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
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

        // --- Storage Settings ---
        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "file".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "file" => StorageBackend::File(
                lookup("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data")),
            ),
            "postgres" => StorageBackend::Postgres(
                lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            ),
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of memory, file, postgres", other),
                ))
            }
        };

        // --- Retry Settings ---
        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", defaults.max_attempts)?,
            base_delay_ms: parse_or(&lookup, "RETRY_BASE_DELAY_MS", defaults.base_delay_ms)?,
            max_delay_ms: parse_or(&lookup, "RETRY_MAX_DELAY_MS", defaults.max_delay_ms)?,
            backoff_multiplier: defaults.backoff_multiplier,
            jitter: parse_or(&lookup, "RETRY_JITTER", defaults.jitter)?,
        };
        if retry.base_delay_ms > retry.max_delay_ms {
            return Err(ConfigError::InvalidValue(
                "RETRY_BASE_DELAY_MS".to_string(),
                "must not exceed RETRY_MAX_DELAY_MS".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            storage,
            cors_origin,
            retry,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}
