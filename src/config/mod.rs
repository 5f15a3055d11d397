//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions (Config, ServerConfig, DatabaseConfig, PersistenceConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConfigError, DatabaseConfig, PersistenceConfig, ServerConfig};
pub use validation::{ValidationError, validate};
