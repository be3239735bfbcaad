//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use recipe_feed_core::{CoreSettings, DeletionPolicy, ReviewPolicy, DEFAULT_MAX_PAGE_SIZE};
use std::net::SocketAddr;
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

/// Where the service keeps its data.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local state, lost on restart. Meant for demos and local runs.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub log_level: Level,
    pub db_max_connections: u32,
    pub cors_origin: String,
    pub core: CoreSettings,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server ---
        let bind_address = parse_or("BIND_ADDRESS", &var, "0.0.0.0:3000".parse().ok())?;
        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StorageBackend::Postgres {
                database_url: var("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", &var, Some(5))?;

        // --- Core policies ---
        let max_page_size: u32 = parse_or("MAX_PAGE_SIZE", &var, Some(DEFAULT_MAX_PAGE_SIZE))?;
        if max_page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_PAGE_SIZE".to_string(),
                "must be positive".to_string(),
            ));
        }
        let review_policy: ReviewPolicy =
            parse_or("REVIEW_POLICY", &var, Some(ReviewPolicy::default()))?;
        let deletion_policy: DeletionPolicy =
            parse_or("DELETION_POLICY", &var, Some(DeletionPolicy::default()))?;

        Ok(Self {
            bind_address,
            storage,
            log_level,
            db_max_connections,
            cors_origin,
            core: CoreSettings {
                max_page_size,
                review_policy,
                deletion_policy,
            },
        })
    }
}

/// Parses `key` when set, otherwise falls back to `default`.
fn parse_or<T>(
    key: &str,
    var: &impl Fn(&str) -> Option<String>,
    default: Option<T>,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
