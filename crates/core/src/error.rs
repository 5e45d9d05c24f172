//! Collaborator error types

use thiserror::Error;

/// Errors returned by an agent-management collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// True when a create call collided with a same-named resource
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Unknown resource category key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown resource category: {0}")]
pub struct CategoryParseError(pub String);

pub type Result<T> = std::result::Result<T, ClientError>;
