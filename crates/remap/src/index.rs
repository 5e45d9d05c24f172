//! Identity Index Builder
//!
//! Maps identifier → display name (forward) or display name → identifier
//! (reverse) for one resource category of one agent or flow.
//!
//! Display names are assumed unique per category. When they are not, the
//! reverse map keeps the resource listed last and records the collision so
//! callers can surface it.

use std::collections::HashMap;

use cx_porter_core::{AgentClient, CopyEvent, CopyObserver, ResourceCategory, Resource};

use crate::error::{RemapError, Result};

/// Display name shared by two resources in a reverse index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCollision {
    pub display_name: String,
    /// Identifier now stored under the display name
    pub kept: String,
    /// Identifier that was overwritten
    pub dropped: String,
}

/// Lookup table for one category
#[derive(Debug, Clone)]
pub struct IdentityIndex {
    category: ResourceCategory,
    reverse: bool,
    entries: HashMap<String, String>,
    collisions: Vec<IndexCollision>,
}

impl IdentityIndex {
    /// Empty index
    pub fn new(category: ResourceCategory, reverse: bool) -> Self {
        Self {
            category,
            reverse,
            entries: HashMap::new(),
            collisions: Vec::new(),
        }
    }

    /// Build from `(key, value)` pairs already in the index's orientation
    pub fn from_pairs<K, V>(
        category: ResourceCategory,
        reverse: bool,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut index = Self::new(category, reverse);
        for (key, value) in pairs {
            index.insert(key.into(), value.into());
        }
        index
    }

    fn insert(&mut self, key: String, value: String) {
        if let Some(previous) = self.entries.insert(key.clone(), value.clone()) {
            if previous != value {
                tracing::warn!(
                    category = %self.category,
                    key = %key,
                    kept = %value,
                    dropped = %previous,
                    "Duplicate key while building index, last one wins"
                );
                self.collisions.push(IndexCollision {
                    display_name: key,
                    kept: value,
                    dropped: previous,
                });
            }
        }
    }

    /// Resolve a key, failing with `LookupMiss` when it is absent
    pub fn lookup(&self, key: &str) -> Result<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| RemapError::lookup_miss(self.category, key))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Same index with keys and values swapped
    ///
    /// Keys are visited in sorted order, so collisions resolve the same way
    /// on every call.
    pub fn inverted(&self) -> Self {
        let mut pairs: Vec<(&String, &String)> = self.entries.iter().collect();
        pairs.sort();
        let mut index = Self::new(self.category, !self.reverse);
        for (key, value) in pairs {
            index.insert(value.clone(), key.clone());
        }
        index
    }

    pub fn category(&self) -> ResourceCategory {
        self.category
    }

    /// True for display name → identifier
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Display-name collisions seen while building
    pub fn collisions(&self) -> &[IndexCollision] {
        &self.collisions
    }

    /// Send one `IndexCollision` event per recorded collision
    pub fn report_collisions(&self, observer: &dyn CopyObserver) {
        for collision in &self.collisions {
            observer.notify(&CopyEvent::IndexCollision {
                category: self.category,
                display_name: collision.display_name.clone(),
                kept: collision.kept.clone(),
                dropped: collision.dropped.clone(),
            });
        }
    }
}

fn pairs_of<T: Resource>(resources: &[T]) -> Vec<(String, String)> {
    resources
        .iter()
        .map(|r| (r.name().to_string(), r.display_name().to_string()))
        .collect()
}

/// `(identifier, display name)` of every resource of `category` under `parent`
///
/// `parent` is the agent identifier, or the flow identifier for pages and
/// route groups.
pub async fn list_identities(
    client: &dyn AgentClient,
    parent: &str,
    category: ResourceCategory,
) -> Result<Vec<(String, String)>> {
    let pairs = match category {
        ResourceCategory::Flows => pairs_of(&client.list_flows(parent).await?),
        ResourceCategory::Intents => pairs_of(&client.list_intents(parent).await?),
        ResourceCategory::EntityTypes => pairs_of(&client.list_entity_types(parent).await?),
        ResourceCategory::Webhooks => pairs_of(&client.list_webhooks(parent).await?),
        ResourceCategory::Pages => pairs_of(&client.list_pages(parent).await?),
        ResourceCategory::RouteGroups => {
            pairs_of(&client.list_transition_route_groups(parent).await?)
        }
    };
    Ok(pairs)
}

/// List every resource of `category` and index it
///
/// Forward (`reverse == false`): identifier → display name.
/// Reverse: display name → identifier, last listed resource wins on
/// duplicate display names.
pub async fn build_index(
    client: &dyn AgentClient,
    parent: &str,
    category: ResourceCategory,
    reverse: bool,
) -> Result<IdentityIndex> {
    let pairs = list_identities(client, parent, category).await?;

    let index = if reverse {
        IdentityIndex::from_pairs(category, true, pairs.into_iter().map(|(id, n)| (n, id)))
    } else {
        IdentityIndex::from_pairs(category, false, pairs)
    };

    tracing::debug!(
        category = %category,
        parent = %parent,
        reverse,
        entries = index.len(),
        "Built identity index"
    );

    Ok(index)
}
