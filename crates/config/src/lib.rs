//! Configuration management for agent-to-agent copies
//!
//! Supports loading configuration from:
//! - TOML/YAML/JSON files under `config/`
//! - Environment variables (`CX_PORTER__` prefix)
//! - Service-account credentials (project path derivation)

pub mod constants;
pub mod credentials;
pub mod settings;

pub use credentials::ProjectContext;
pub use settings::{
    load_settings, load_settings_from, ApiConfig, DataFormat, ExportConfig, ImportOption,
    ObservabilityConfig, Settings, TransferConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
