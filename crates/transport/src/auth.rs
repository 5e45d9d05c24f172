//! Bearer token acquisition

use std::sync::Arc;

use async_trait::async_trait;
use cx_porter_config::ApiConfig;
use parking_lot::Mutex;
use tokio::process::Command;

use crate::error::{Result, TransportError};

/// Source of bearer tokens for API calls
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;

    /// Drop any cached token so the next `token` call fetches a fresh one
    fn invalidate(&self) {}
}

/// Runs a credential-printing command and uses its stdout as the token
///
/// The default command is
/// `gcloud auth application-default print-access-token`. The token is
/// cached after the first successful run and kept until `invalidate`.
#[derive(Debug)]
pub struct CommandTokenProvider {
    program: String,
    args: Vec<String>,
    cached: Mutex<Option<String>>,
}

impl CommandTokenProvider {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| TransportError::Configuration("Token command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cached: Mutex::new(None),
        })
    }

    async fn fetch(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| TransportError::Token(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::Token(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8(output.stdout)
            .map_err(|e| TransportError::Token(format!("Token is not UTF-8: {}", e)))?;
        let token = token.trim_end_matches(['\r', '\n']).to_string();
        if token.is_empty() {
            return Err(TransportError::Token(format!(
                "{} printed an empty token",
                self.program
            )));
        }

        tracing::debug!(program = %self.program, "Acquired access token");
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for CommandTokenProvider {
    async fn token(&self) -> Result<String> {
        let cached = self.cached.lock().clone();
        if let Some(token) = cached {
            return Ok(token);
        }
        let token = self.fetch().await?;
        *self.cached.lock() = Some(token.clone());
        Ok(token)
    }

    fn invalidate(&self) {
        if self.cached.lock().take().is_some() {
            tracing::debug!(program = %self.program, "Discarded cached access token");
        }
    }
}

/// Fixed token supplied by configuration
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Static token when configured, otherwise the token command
pub fn token_provider(config: &ApiConfig) -> Result<Arc<dyn TokenProvider>> {
    match config.access_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Arc::new(StaticTokenProvider::new(token))),
        _ => Ok(Arc::new(CommandTokenProvider::new(&config.token_command)?)),
    }
}
