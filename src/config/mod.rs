//! Configuration management for the upscaler
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. Configuration file (YAML, TOML or JSON, chosen by extension)
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use upscaler::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! println!("Upscaling via: {}", config.upscale_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `UPSCALER__<key>` or `UPSCALER__<section>__<key>`
//!
//! Examples:
//! - `UPSCALER__UPSCALE_URL=https://upscale.internal/v1/upscale`
//! - `UPSCALER__NO_MESSAGE_DELAY=500ms`
//! - `UPSCALER__HTTP__REQUEST_TIMEOUT=30s`
//!
//! The API key can also be supplied as `UPSCALE_API_KEY`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config.yml`.
//! This can be overridden with `--config` or the `UPSCALER_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, HttpSettings, QueueConfig, QueueProvider, StorageConfig, StorageProvider,
};
pub use validation::ValidationError;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// `path` comes from the command line; when absent `UPSCALER_CONFIG` and then
    /// `config.yml` are tried.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (missing endpoint or key, zero delays, ...)
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, without `.env` or secret lookup
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path.as_ref())?;
        validation::validate(&config)?;
        Ok(config)
    }
}
