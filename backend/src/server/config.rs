//! Service configuration loaded via OrthoConfig.
//!
//! Every value can come from the command line or from `FOLD_*` environment
//! variables (`FOLD_DATABASE_URL`, `FOLD_BIND_ADDR`, `FOLD_SYNC_ENDPOINT`,
//! `FOLD_PUBLISH_TIMEOUT_MS`, `FOLD_POOL_MAX_SIZE`).

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("FOLD_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("FOLD_SYNC_ENDPOINT must be set")]
    MissingSyncEndpoint,
    #[error("invalid bind address `{value}`: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid sync endpoint `{value}`: {source}")]
    InvalidSyncEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Runtime settings for the catalogue service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FOLD")]
pub struct ServiceSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Socket address the HTTP server listens on.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: String,
    /// Ingestion endpoint for sync messages. Required at startup.
    pub sync_endpoint: Option<String>,
    /// Upper bound on a single publish, in milliseconds.
    #[ortho_config(default = 5_000)]
    pub publish_timeout_ms: u64,
    /// Maximum number of pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
}

impl ServiceSettings {
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: self.bind_addr.clone(),
                source,
            })
    }

    /// Blank counts as missing.
    pub fn sync_endpoint(&self) -> Result<Url, SettingsError> {
        let value = self
            .sync_endpoint
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SettingsError::MissingSyncEndpoint)?;
        Url::parse(value).map_err(|source| SettingsError::InvalidSyncEndpoint {
            value: value.to_owned(),
            source,
        })
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size
    }
}
