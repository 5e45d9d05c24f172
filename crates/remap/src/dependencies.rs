//! Dependency Extractor
//!
//! Walks pages and collects the identifiers of every resource they reference,
//! grouped by category. The result is what has to exist in a destination
//! agent before the pages themselves can be copied.

use std::collections::{BTreeMap, BTreeSet};

use cx_porter_core::{
    flow_path, is_system_entity, AgentClient, EventHandler, Fulfillment, Page, ResourceCategory,
    TransitionRouteGroup,
};
use serde::{Deserialize, Serialize};

use crate::error::{RemapError, Result};

/// Identifiers selected per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSelection(BTreeMap<ResourceCategory, BTreeSet<String>>);

impl ResourceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one identifier; returns false if it was already selected
    pub fn insert(&mut self, category: ResourceCategory, id: impl Into<String>) -> bool {
        self.0.entry(category).or_default().insert(id.into())
    }

    /// Builder form of `insert` for a batch of identifiers
    pub fn with<I, S>(mut self, category: ResourceCategory, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.insert(category, id);
        }
        self
    }

    pub fn get(&self, category: ResourceCategory) -> Option<&BTreeSet<String>> {
        self.0.get(&category)
    }

    pub fn contains(&self, category: ResourceCategory, id: &str) -> bool {
        self.0.get(&category).map(|s| s.contains(id)).unwrap_or(false)
    }

    /// Categories with at least one identifier
    pub fn categories(&self) -> impl Iterator<Item = ResourceCategory> + '_ {
        self.0
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(c, _)| *c)
    }

    pub fn count(&self, category: ResourceCategory) -> usize {
        self.0.get(&category).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    /// Merge another selection into this one
    pub fn extend(&mut self, other: ResourceSelection) {
        for (category, ids) in other.0 {
            self.0.entry(category).or_default().extend(ids);
        }
    }
}

impl FromIterator<(ResourceCategory, String)> for ResourceSelection {
    fn from_iter<T: IntoIterator<Item = (ResourceCategory, String)>>(iter: T) -> Self {
        let mut selection = Self::new();
        for (category, id) in iter {
            selection.insert(category, id);
        }
        selection
    }
}

fn collect_webhook(selection: &mut ResourceSelection, fulfillment: Option<&Fulfillment>) {
    if let Some(webhook) = fulfillment.and_then(|f| f.webhook.as_deref()) {
        selection.insert(ResourceCategory::Webhooks, webhook);
    }
}

fn collect_handlers(selection: &mut ResourceSelection, handlers: &[EventHandler]) {
    for handler in handlers {
        collect_webhook(selection, handler.trigger_fulfillment.as_ref());
    }
}

/// Collect every resource referenced by `pages`
///
/// Collected per page:
/// - the entry fulfillment webhook
/// - each transition route and event handler trigger-fulfillment webhook
/// - each form parameter's entity type (built-ins skipped) and the webhooks
///   of its initial prompt and reprompt handlers
/// - each attached route group, plus the intents of that group's routes
///
/// Intents of the page's own routes are not collected; only route-group
/// intents are. The route groups of the flow owning the first page are listed
/// once, and only when some page references a route group. An empty page
/// list returns an empty selection without touching the client.
pub async fn extract_dependencies(
    client: &dyn AgentClient,
    pages: &[Page],
) -> Result<ResourceSelection> {
    let mut selection = ResourceSelection::new();
    let Some(first) = pages.first() else {
        return Ok(selection);
    };

    let mut route_groups: Option<Vec<TransitionRouteGroup>> = None;

    for page in pages {
        collect_webhook(&mut selection, page.entry_fulfillment.as_ref());

        for route in &page.transition_routes {
            collect_webhook(&mut selection, route.trigger_fulfillment.as_ref());
        }

        collect_handlers(&mut selection, &page.event_handlers);

        for param in page.form_parameters() {
            if !param.entity_type.is_empty() && !is_system_entity(&param.entity_type) {
                selection.insert(ResourceCategory::EntityTypes, param.entity_type.as_str());
            }
            if let Some(fill) = &param.fill_behavior {
                collect_webhook(&mut selection, fill.initial_prompt_fulfillment.as_ref());
                collect_handlers(&mut selection, &fill.reprompt_event_handlers);
            }
        }

        if page.transition_route_groups.is_empty() {
            continue;
        }

        if route_groups.is_none() {
            let flow = flow_path(&first.name)
                .ok_or_else(|| RemapError::InvalidName(first.name.clone()))?;
            route_groups = Some(client.list_transition_route_groups(&flow).await?);
        }
        let groups = route_groups.as_deref().unwrap_or(&[]);

        for reference in &page.transition_route_groups {
            selection.insert(ResourceCategory::RouteGroups, reference.as_str());
            let group = groups
                .iter()
                .find(|g| &g.name == reference)
                .ok_or_else(|| RemapError::lookup_miss(ResourceCategory::RouteGroups, reference))?;
            for route in &group.transition_routes {
                if let Some(intent) = &route.intent {
                    selection.insert(ResourceCategory::Intents, intent.as_str());
                }
            }
        }
    }

    tracing::debug!(
        pages = pages.len(),
        webhooks = selection.count(ResourceCategory::Webhooks),
        entities = selection.count(ResourceCategory::EntityTypes),
        route_groups = selection.count(ResourceCategory::RouteGroups),
        intents = selection.count(ResourceCategory::Intents),
        "Extracted page dependencies"
    );

    Ok(selection)
}
