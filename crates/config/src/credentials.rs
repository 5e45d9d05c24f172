//! Project context derived from service-account credentials

use serde::Deserialize;
use std::path::Path;

use crate::constants::api::GLOBAL_LOCATION;
use crate::ConfigError;

/// Environment variable holding the service-account key path
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    #[serde(default)]
    project_id: Option<String>,
}

/// Project-level parent path (`projects/<project>/locations/<location>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    project_id: String,
    location: String,
}

impl ProjectContext {
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
        }
    }

    /// Read `project_id` from a service-account JSON key; location is `global`
    pub fn from_credentials_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::ParseError(format!("{}: {}", path.display(), e))
            }
        })?;
        Self::from_credentials_json(&raw)
    }

    /// Read the key named by `GOOGLE_APPLICATION_CREDENTIALS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CREDENTIALS_ENV)
            .map_err(|e| ConfigError::Environment(format!("{}: {}", CREDENTIALS_ENV, e)))?;
        Self::from_credentials_file(path)
    }

    pub fn from_credentials_json(raw: &str) -> Result<Self, ConfigError> {
        let key: ServiceAccountKey =
            serde_json::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        match key.project_id {
            Some(project_id) if !project_id.trim().is_empty() => {
                Ok(Self::new(project_id, GLOBAL_LOCATION))
            }
            _ => Err(ConfigError::MissingField("project_id".to_string())),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// `projects/<project>/locations/<location>`
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// Full agent identifier for a bare agent id
    pub fn agent_path(&self, agent_id: &str) -> String {
        format!("{}/agents/{}", self.parent(), agent_id)
    }
}
