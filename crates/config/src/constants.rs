//! Centralized constants
//!
//! Default values shared by the settings layer, the REST transport and the
//! copy orchestrator.

/// Agent-management API defaults
pub mod api {
    /// Global REST endpoint; regional agents use `<location>-dialogflow.googleapis.com`
    pub const ENDPOINT: &str = "https://dialogflow.googleapis.com";

    /// API version segment
    pub const VERSION: &str = "v3beta1";

    /// Regional host suffix
    pub const REGIONAL_HOST_SUFFIX: &str = "-dialogflow.googleapis.com";

    /// Request timeout
    pub const TIMEOUT_SECS: u64 = 30;

    /// Command printing an application-default access token
    pub const TOKEN_COMMAND: [&str; 4] = ["gcloud", "auth", "application-default", "print-access-token"];

    /// Location used when a project path is derived from credentials
    pub const GLOBAL_LOCATION: &str = "global";
}

/// Copy defaults
pub mod transfer {
    /// Flow whose route groups are collected in a bulk copy
    pub const DEFAULT_FLOW: &str = "Default Start Flow";

    /// Delay before each intent creation in a bulk copy
    pub const PACING_MS: u64 = 1000;
}

/// Export/import defaults
pub mod export {
    pub const DATA_FORMAT: &str = "BLOB";
    pub const IMPORT_OPTION: &str = "FALLBACK";
}

/// Prefix of environment variable overrides (`CX_PORTER__API__ENDPOINT`, ...)
pub const ENV_PREFIX: &str = "CX_PORTER";
