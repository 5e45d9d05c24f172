//! Agent-to-agent copy orchestration
//!
//! Features:
//! - Bulk copy of selected webhooks, entity types, intents and route groups
//! - Single intent / entity type copies by display name
//! - Page-shell pre-creation ahead of page copies
//! - Tabular views (route groups, training phrases, list parameters)
//! - Tracing subscriber setup from observability settings

pub mod copier;
pub mod error;
pub mod report;
pub mod shells;
pub mod tables;
pub mod telemetry;

use std::sync::Arc;

use cx_porter_config::Settings;
use cx_porter_core::AgentClient;
use cx_porter_transport::{token_provider, RestAgentClient};

pub use copier::AgentCopier;
pub use error::{Result, TransferError};
pub use report::{CopyOutcome, CopyRecord, CopyReport};
pub use shells::page_shell_names;
pub use tables::{
    find_list_parameters, intent_phrase_table, route_group_table, IntentPhraseRow,
    ListParameterRow, RouteGroupRow,
};
pub use telemetry::init_tracing;

/// REST collaborator authenticated from `settings.api`
pub fn rest_client(settings: &Settings) -> Result<Arc<dyn AgentClient>> {
    let client = RestAgentClient::new(&settings.api, token_provider(&settings.api)?)?;
    Ok(Arc::new(client))
}

/// Copier over the REST collaborator, configured from `settings`
pub fn rest_copier(settings: &Settings) -> Result<AgentCopier> {
    settings.validate()?;
    Ok(AgentCopier::from_config(rest_client(settings)?, &settings.transfer))
}
