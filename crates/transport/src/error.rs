//! Transport errors

use cx_porter_core::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Token error: {0}")]
    Token(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<cx_porter_config::ConfigError> for TransportError {
    fn from(err: cx_porter_config::ConfigError) -> Self {
        TransportError::Configuration(err.to_string())
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Token(msg) => ClientError::Unauthorized(msg),
            TransportError::Network(msg) => ClientError::Network(msg),
            TransportError::Status { status, body } => crate::http::status_error(status, body),
            TransportError::InvalidResponse(msg) => ClientError::InvalidResponse(msg),
            TransportError::Configuration(msg) => ClientError::Api {
                status: 0,
                message: msg,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
