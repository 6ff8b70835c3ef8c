//! Configuration management for minls
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `.env` files and environment variables
//! 4. Command line overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use minls::config::{Config, Overrides};
//!
//! let config = Config::load(&Overrides::default()).expect("Failed to load configuration");
//! println!("Ledger lives in: {}", config.ledger_dir().display());
//! ```
//!
//! # Environment Variables
//!
//! Non-secret settings can be overridden with the pattern
//! `MINLS__<section>__<key>`:
//! - `MINLS__LEDGER__RETENTION=30d`
//! - `MINLS__STORAGE__PUBLIC_BUCKET=files`
//! - `MINLS__LOGGING__LEVEL=debug`
//!
//! Endpoints and secrets use the plain names `MINIO_ENDPOINT`,
//! `MINIO_ACCESS_KEY`, `MINIO_ACCESS_SECRET`, `YOURLS_ENDPOINT` and
//! `YOURLS_SIGNATURE`, read from the environment or a `.env` file next to the
//! executable.
//!
//! # Configuration File
//!
//! By default the configuration is loaded from `minls.toml` next to the
//! executable. This can be overridden using `--config` or the `MINLS_CONFIG`
//! environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::HumanDuration;
pub use models::{Config, LedgerConfig, LoggingConfig, ShortenerConfig, StorageConfig};
pub use sources::Overrides;
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment + overrides)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (zero retention, bad ledger file name, etc.)
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let config = sources::load(overrides)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Ensure everything `upload` needs is present
    pub fn validate_for_upload(&self) -> Result<(), ConfigError> {
        validation::validate_for_upload(self)?;
        Ok(())
    }
}
