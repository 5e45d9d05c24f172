//! Remapping errors

use cx_porter_core::{ClientError, ResourceCategory};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemapError {
    /// A reference has no entry in the index it must be translated through
    #[error("Lookup error: '{key}' not found in {category} index")]
    LookupMiss {
        category: ResourceCategory,
        key: String,
    },

    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

impl RemapError {
    pub fn lookup_miss(category: ResourceCategory, key: impl Into<String>) -> Self {
        Self::LookupMiss {
            category,
            key: key.into(),
        }
    }

    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::LookupMiss { .. })
    }
}

pub type Result<T> = std::result::Result<T, RemapError>;
