//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{api, export, transfer, ENV_PREFIX};
use crate::ConfigError;

/// Main settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Agent-management API access
    #[serde(default)]
    pub api: ApiConfig,

    /// Copy behaviour
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Flow export/import jobs
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_api()?;
        self.validate_transfer()?;
        self.validate_export()?;
        Ok(())
    }

    fn validate_api(&self) -> Result<(), ConfigError> {
        if self.api.endpoint.trim().is_empty() {
            return Err(invalid("api.endpoint", "Endpoint cannot be empty"));
        }
        if !self.api.endpoint.starts_with("http://") && !self.api.endpoint.starts_with("https://") {
            return Err(invalid(
                "api.endpoint",
                format!("Must be an http(s) URL, got {}", self.api.endpoint),
            ));
        }
        if self.api.version.trim().is_empty() {
            return Err(invalid("api.version", "Version cannot be empty"));
        }
        if self.api.timeout_seconds == 0 {
            return Err(invalid("api.timeout_seconds", "Timeout must be positive"));
        }
        let has_token = self
            .api
            .access_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if !has_token && self.api.token_command.is_empty() {
            return Err(invalid(
                "api.token_command",
                "A token command is required when no access token is configured",
            ));
        }
        Ok(())
    }

    fn validate_transfer(&self) -> Result<(), ConfigError> {
        if self.transfer.source_flow.trim().is_empty() {
            return Err(invalid("transfer.source_flow", "Flow name cannot be empty"));
        }
        if self.transfer.destination_flow.trim().is_empty() {
            return Err(invalid(
                "transfer.destination_flow",
                "Flow name cannot be empty",
            ));
        }
        Ok(())
    }

    fn validate_export(&self) -> Result<(), ConfigError> {
        self.export.data_format()?;
        self.export.import_option()?;
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

// ============================================================================
// API
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API version segment (`v3beta1`)
    #[serde(default = "default_version")]
    pub version: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Command whose stdout is a bearer token
    #[serde(default = "default_token_command")]
    pub token_command: Vec<String>,

    /// Static bearer token; takes precedence over the command
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_endpoint() -> String {
    api::ENDPOINT.to_string()
}

fn default_version() -> String {
    api::VERSION.to_string()
}

fn default_timeout_seconds() -> u64 {
    api::TIMEOUT_SECS
}

fn default_token_command() -> Vec<String> {
    api::TOKEN_COMMAND.iter().map(|s| s.to_string()).collect()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            version: default_version(),
            timeout_seconds: default_timeout_seconds(),
            token_command: default_token_command(),
            access_token: None,
        }
    }
}

// ============================================================================
// Transfer
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Delay before each intent creation in a bulk copy
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Source flow whose route groups are copied
    #[serde(default = "default_flow")]
    pub source_flow: String,

    /// Destination flow receiving route groups and page shells
    #[serde(default = "default_flow")]
    pub destination_flow: String,
}

fn default_pacing_ms() -> u64 {
    transfer::PACING_MS
}

fn default_flow() -> String {
    transfer::DEFAULT_FLOW.to_string()
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            source_flow: default_flow(),
            destination_flow: default_flow(),
        }
    }
}

// ============================================================================
// Export / import
// ============================================================================

/// Serialization of an exported flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataFormat {
    #[default]
    Blob,
    Json,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "BLOB",
            Self::Json => "JSON",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BLOB" => Ok(Self::Blob),
            "JSON" => Ok(Self::Json),
            other => Err(invalid(
                "export.data_format",
                format!("Expected BLOB or JSON, got {}", other),
            )),
        }
    }
}

/// Behaviour on display-name conflicts when importing a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportOption {
    /// Keep existing resources
    Keep,
    /// Fall back to the imported resource only when none exists
    #[default]
    Fallback,
}

impl ImportOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Fallback => "FALLBACK",
        }
    }
}

impl fmt::Display for ImportOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportOption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KEEP" => Ok(Self::Keep),
            "FALLBACK" => Ok(Self::Fallback),
            other => Err(invalid(
                "export.import_option",
                format!("Expected KEEP or FALLBACK, got {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// `BLOB` or `JSON`
    #[serde(default = "default_data_format")]
    pub data_format: String,

    /// Export flows referenced by the exported one
    #[serde(default = "default_true")]
    pub include_referenced_flows: bool,

    /// `FALLBACK` or `KEEP`
    #[serde(default = "default_import_option")]
    pub import_option: String,
}

fn default_data_format() -> String {
    export::DATA_FORMAT.to_string()
}

fn default_import_option() -> String {
    export::IMPORT_OPTION.to_string()
}

fn default_true() -> bool {
    true
}

impl ExportConfig {
    pub fn data_format(&self) -> Result<DataFormat, ConfigError> {
        self.data_format.parse()
    }

    pub fn import_option(&self) -> Result<ImportOption, ConfigError> {
        self.import_option.parse()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            data_format: default_data_format(),
            include_referenced_flows: true,
            import_option: default_import_option(),
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load settings from `config/` and the environment
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/default.{toml,yaml,json}`
/// 2. `config/{env}.{toml,yaml,json}`
/// 3. `CX_PORTER__SECTION__FIELD` environment variables
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        endpoint = %settings.api.endpoint,
        version = %settings.api.version,
        source_flow = %settings.transfer.source_flow,
        "Settings loaded"
    );

    Ok(settings)
}
