//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{default_autosave_interval, default_database_path, default_true};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Process identity and endpoints.
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// When and how the registry talks to the database.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name used in logs (e.g., "warden-eu1").
    pub name: String,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    pub metrics_port: Option<u16>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or ":memory:".
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Persistence schedule for the punishment registry.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Seconds between autosaves (default: 60, 0 disables; a final save
    /// still runs on shutdown).
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval: u64,
    /// Wait for stored punishments to load before serving (default: true).
    /// When false the load runs in the background.
    #[serde(default = "default_true")]
    pub load_on_startup: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            autosave_interval: default_autosave_interval(),
            load_on_startup: true,
        }
    }
}

impl PersistenceConfig {
    /// Autosave period, or `None` when autosave is off.
    pub fn autosave_period(&self) -> Option<Duration> {
        (self.autosave_interval > 0).then(|| Duration::from_secs(self.autosave_interval))
    }
}
