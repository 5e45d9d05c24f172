//! Transfer errors

use cx_porter_config::ConfigError;
use cx_porter_core::ClientError;
use cx_porter_remap::RemapError;
use cx_porter_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Remap error: {0}")]
    Remap(#[from] RemapError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, TransferError>;
