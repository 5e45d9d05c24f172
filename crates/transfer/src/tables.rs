//! Tabular views of agent content
//!
//! Row structs serialize with serde, so callers can write them as JSON lines
//! or feed them to any table writer.

use std::collections::HashMap;

use cx_porter_core::{is_system_entity, last_segment, AgentClient, Intent, Resource};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One route of a transition route group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGroupRow {
    pub flow: String,
    pub route_group: String,
    pub intent: Option<String>,
    pub webhook: Option<String>,
    pub webhook_tag: Option<String>,
    pub fulfillment_message: Option<String>,
}

/// One training phrase of an intent
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentPhraseRow {
    pub intent: String,
    pub training_phrase: String,
}

/// One form parameter collected as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParameterRow {
    pub flow: String,
    pub page: String,
    pub parameter: String,
    pub entity_type: String,
}

/// Display names keyed by the last segment of each identifier
fn by_last_segment<T: Resource>(resources: &[T]) -> HashMap<String, String> {
    resources
        .iter()
        .map(|r| (last_segment(r.name()).to_string(), r.display_name().to_string()))
        .collect()
}

/// Resolve a reference through a last-segment map, keeping it as-is on a miss
fn resolve(names: &HashMap<String, String>, reference: &str) -> String {
    names
        .get(last_segment(reference))
        .cloned()
        .unwrap_or_else(|| reference.to_string())
}

/// Every route of every route group of every flow in `agent`
pub async fn route_group_table(client: &dyn AgentClient, agent: &str) -> Result<Vec<RouteGroupRow>> {
    let flows = client.list_flows(agent).await?;
    let intents = by_last_segment(&client.list_intents(agent).await?);
    let webhooks = by_last_segment(&client.list_webhooks(agent).await?);

    let mut rows = Vec::new();
    for flow in &flows {
        for group in client.list_transition_route_groups(&flow.name).await? {
            for route in &group.transition_routes {
                let fulfillment = route.trigger_fulfillment.as_ref();
                rows.push(RouteGroupRow {
                    flow: flow.display_name.clone(),
                    route_group: group.display_name.clone(),
                    intent: route.intent.as_deref().map(|i| resolve(&intents, i)),
                    webhook: route.webhook().map(|w| resolve(&webhooks, w)),
                    webhook_tag: fulfillment.and_then(|f| f.tag.clone()),
                    fulfillment_message: fulfillment
                        .and_then(|f| f.messages.first())
                        .and_then(|m| m.first_text())
                        .map(str::to_string),
                });
            }
        }
    }

    tracing::debug!(agent = %agent, rows = rows.len(), "Tabulated route groups");
    Ok(rows)
}

/// One row per training phrase, sorted by intent then phrase
///
/// Intents without training phrases get a single row with an empty phrase.
pub fn intent_phrase_table(intents: &[Intent]) -> Vec<IntentPhraseRow> {
    let mut rows: Vec<IntentPhraseRow> = intents
        .iter()
        .flat_map(|intent| {
            let phrases: Vec<String> = if intent.training_phrases.is_empty() {
                vec![String::new()]
            } else {
                intent.training_phrases.iter().map(|tp| tp.text()).collect()
            };
            phrases.into_iter().map(|training_phrase| IntentPhraseRow {
                intent: intent.display_name.clone(),
                training_phrase,
            })
        })
        .collect();
    rows.sort();
    rows
}

/// Form parameters collected as lists, across every page of every flow
///
/// Built-in entity types are shown by their last segment, custom ones by
/// display name.
pub async fn find_list_parameters(client: &dyn AgentClient, agent: &str) -> Result<Vec<ListParameterRow>> {
    let flows = client.list_flows(agent).await?;
    let entity_types = by_last_segment(&client.list_entity_types(agent).await?);

    let mut rows = Vec::new();
    for flow in &flows {
        for page in client.list_pages(&flow.name).await? {
            for parameter in page.form_parameters().iter().filter(|p| p.is_list) {
                let entity_type = if is_system_entity(&parameter.entity_type) {
                    last_segment(&parameter.entity_type).to_string()
                } else {
                    resolve(&entity_types, &parameter.entity_type)
                };
                rows.push(ListParameterRow {
                    flow: flow.display_name.clone(),
                    page: page.display_name.clone(),
                    parameter: parameter.display_name.clone(),
                    entity_type,
                });
            }
        }
    }

    tracing::debug!(agent = %agent, rows = rows.len(), "Found list parameters");
    Ok(rows)
}
