//! Copy event observer
//!
//! The orchestrator, rewriter and index builder report notable events here
//! instead of logging inline, so their control flow does not depend on a
//! logging sink and tests can assert on exactly what was reported.

use crate::names::ResourceCategory;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Notable event during index building, rewriting or copying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CopyEvent {
    /// Resource created in the destination
    Created {
        category: ResourceCategory,
        display_name: String,
    },
    /// Destination already had a resource with this display name
    SkippedDuplicate {
        category: ResourceCategory,
        display_name: String,
    },
    /// Creation failed for any other reason
    CreationFailed {
        category: ResourceCategory,
        display_name: String,
        reason: String,
    },
    /// A reference could not be resolved in an index
    LookupMiss {
        category: ResourceCategory,
        key: String,
    },
    /// Two resources share a display name; `kept` overwrote `dropped`
    IndexCollision {
        category: ResourceCategory,
        display_name: String,
        kept: String,
        dropped: String,
    },
}

impl CopyEvent {
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Created { category, .. }
            | Self::SkippedDuplicate { category, .. }
            | Self::CreationFailed { category, .. }
            | Self::LookupMiss { category, .. }
            | Self::IndexCollision { category, .. } => *category,
        }
    }
}

/// Receiver of copy events
pub trait CopyObserver: Send + Sync {
    fn notify(&self, event: &CopyEvent);
}

/// Turns events into log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CopyObserver for TracingObserver {
    fn notify(&self, event: &CopyEvent) {
        match event {
            CopyEvent::Created {
                category,
                display_name,
            } => {
                tracing::info!(category = %category, display_name = %display_name, "Resource created");
            }
            CopyEvent::SkippedDuplicate {
                category,
                display_name,
            } => {
                tracing::info!(
                    category = %category,
                    display_name = %display_name,
                    "Resource already exists, skipping"
                );
            }
            CopyEvent::CreationFailed {
                category,
                display_name,
                reason,
            } => {
                tracing::warn!(
                    category = %category,
                    display_name = %display_name,
                    reason = %reason,
                    "Resource creation failed, continuing"
                );
            }
            CopyEvent::LookupMiss { category, key } => {
                tracing::error!(category = %category, key = %key, "Reference not found in index");
            }
            CopyEvent::IndexCollision {
                category,
                display_name,
                kept,
                dropped,
            } => {
                tracing::warn!(
                    category = %category,
                    display_name = %display_name,
                    kept = %kept,
                    dropped = %dropped,
                    "Duplicate display name in index, last one wins"
                );
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CopyObserver for NoopObserver {
    fn notify(&self, _event: &CopyEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CopyEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<CopyEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&CopyEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl CopyObserver for RecordingObserver {
    fn notify(&self, event: &CopyEvent) {
        self.events.lock().push(event.clone());
    }
}
