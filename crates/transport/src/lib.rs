//! Transport layer for the agent-management API
//!
//! Provides:
//! - Bearer token acquisition (credential command or static token)
//! - `RestAgentClient`, the REST implementation of `AgentClient`
//! - `ExportImportClient` for flow export/import jobs

pub mod auth;
pub mod error;
pub mod http;

pub use auth::{token_provider, CommandTokenProvider, StaticTokenProvider, TokenProvider};
pub use cx_porter_config::{DataFormat, ImportOption};
pub use error::{Result, TransportError};
pub use http::{ApiEndpoint, ExportImportClient, LongRunningOperation, RestAgentClient};
