//! Configuration loading and representation.
//!
//! Read from the environment once at startup:
//!
//! | variable | default |
//! |---|---|
//! | `STOCKROOM_DATABASE_URL` | `sqlite://db/stockroom.db` |
//! | `STOCKROOM_BIND_ADDR` | `0.0.0.0:8080` |
//! | `STOCKROOM_STORE` | `sqlite` (or `memory`) |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://db/stockroom.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid bind address {value:?}: {reason}")]
    BindAddr { value: String, reason: String },

    #[error("unknown store kind {0:?} (expected `sqlite` or `memory`)")]
    StoreKind(String),
}

/// Which repository implementation backs the app.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl core::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" | "in-memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::StoreKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("STOCKROOM_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let raw_addr = lookup("STOCKROOM_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::BindAddr {
            value: raw_addr.clone(),
            reason: e.to_string(),
        })?;

        let store = match lookup("STOCKROOM_STORE") {
            Some(raw) => raw.parse()?,
            None => StoreKind::Sqlite,
        };

        Ok(Self {
            database_url,
            bind_addr,
            store,
        })
    }
}
