//! Core types for copying conversational-agent resources between agents
//!
//! This crate provides:
//! - The resource model (flows, pages, routes, intents, entity types, webhooks)
//! - Identifier path helpers, resource categories and sentinel targets
//! - The `AgentClient` collaborator trait and an in-memory implementation
//! - The `CopyObserver` event channel used by the copy engine

pub mod error;
pub mod memory;
pub mod names;
pub mod resources;
pub mod traits;

pub use error::{CategoryParseError, ClientError, Result};
pub use memory::InMemoryAgentClient;
pub use names::{
    agent_path, flow_path, is_system_entity, last_segment, location, ResourceCategory, Sentinel,
    SYSTEM_ENTITY_MARKER,
};
pub use resources::{
    EntityEntry, EntityType, EventHandler, FillBehavior, Flow, Form, FormParameter, Fulfillment,
    Intent, IntentParameter, Page, Resource, ResponseMessage, TextMessage, TrainingPhrase,
    TrainingPhrasePart, TransitionRoute, TransitionRouteGroup, Webhook,
};
pub use traits::{
    AgentClient, CopyEvent, CopyObserver, NoopObserver, RecordingObserver, TracingObserver,
};
