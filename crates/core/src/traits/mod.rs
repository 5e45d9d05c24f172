//! Core traits for agent-to-agent copies
//!
//! ```text
//! Collaborator:
//!   - AgentClient: list/get/create per resource category
//!
//! Reporting:
//!   - CopyObserver: receives CopyEvent notifications
//! ```

mod client;
mod observer;

pub use client::AgentClient;
pub use observer::{CopyEvent, CopyObserver, NoopObserver, RecordingObserver, TracingObserver};
