//! # Runtime Configuration
//!
//! Read once at startup and handed to whichever store adapter the
//! database URL names. Nothing reads the environment after this.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:houseboard.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STATIC_DIR: &str = "./static";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("unsupported database URL {0:?} (expected sqlite: or postgres://)")]
    UnsupportedDatabase(String),
}

/// Which relational store the database URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Postgres,
}

impl StoreBackend {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("sqlite:") {
            Ok(StoreBackend::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(StoreBackend::Postgres)
        } else {
            Err(ConfigError::UnsupportedDatabase(url.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumConfig {
    pub database_url: String,
    pub backend: StoreBackend,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub static_dir: PathBuf,
}

impl ForumConfig {
    /// Builds the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds the config from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let backend = StoreBackend::from_url(&database_url)?;

        let port = match get("HOUSEBOARD_PORT") {
            Some(raw) => parse_number("HOUSEBOARD_PORT", &raw)?,
            None => DEFAULT_PORT,
        };
        let max_connections = match get("HOUSEBOARD_MAX_CONNECTIONS") {
            Some(raw) => parse_number("HOUSEBOARD_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            backend,
            host: get("HOUSEBOARD_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            max_connections,
            static_dir: get("HOUSEBOARD_STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}
