//! In-memory agent-management collaborator
//!
//! Behaves like the service for the calls the copy engine makes:
//! - identifiers are `<parent>/<collection>/<uuid>`, assigned on create
//! - creating a second resource with an existing display name under the same
//!   parent fails with `ClientError::AlreadyExists`
//! - listing an unknown parent yields an empty list
//!
//! Seeding bypasses the duplicate check so tests can build agents with
//! colliding display names.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::ClientError;
use crate::names::ResourceCategory;
use crate::resources::{EntityType, Flow, Intent, Page, Resource, TransitionRouteGroup, Webhook};
use crate::traits::AgentClient;
use crate::Result;

#[derive(Default)]
struct Store {
    flows: HashMap<String, Vec<Flow>>,
    intents: HashMap<String, Vec<Intent>>,
    entity_types: HashMap<String, Vec<EntityType>>,
    webhooks: HashMap<String, Vec<Webhook>>,
    pages: HashMap<String, Vec<Page>>,
    route_groups: HashMap<String, Vec<TransitionRouteGroup>>,
    create_failures: HashMap<ResourceCategory, ClientError>,
}

/// Process-local collaborator for tests and dry runs
#[derive(Default)]
pub struct InMemoryAgentClient {
    store: Mutex<Store>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

fn assign_name<T: Resource>(parent: &str, category: ResourceCategory, resource: &mut T) {
    if resource.name().is_empty() {
        resource.set_name(format!(
            "{}/{}/{}",
            parent,
            category.collection(),
            Uuid::new_v4()
        ));
    }
}

fn seed<T: Resource + Clone>(
    items: &mut HashMap<String, Vec<T>>,
    parent: &str,
    category: ResourceCategory,
    mut resource: T,
) -> T {
    assign_name(parent, category, &mut resource);
    items
        .entry(parent.to_string())
        .or_default()
        .push(resource.clone());
    resource
}

fn insert<T: Resource + Clone>(
    items: &mut HashMap<String, Vec<T>>,
    parent: &str,
    category: ResourceCategory,
    resource: &T,
) -> Result<T> {
    let existing = items.entry(parent.to_string()).or_default();
    if existing
        .iter()
        .any(|r| r.display_name() == resource.display_name())
    {
        return Err(ClientError::AlreadyExists(format!(
            "{} '{}' already exists under {}",
            category,
            resource.display_name(),
            parent
        )));
    }

    let mut created = resource.clone();
    created.set_name(String::new());
    assign_name(parent, category, &mut created);
    existing.push(created.clone());
    Ok(created)
}

fn list<T: Clone>(items: &HashMap<String, Vec<T>>, parent: &str) -> Vec<T> {
    items.get(parent).cloned().unwrap_or_default()
}

fn find<T: Resource + Clone>(items: &HashMap<String, Vec<T>>, name: &str) -> Option<T> {
    items
        .values()
        .flatten()
        .find(|r| r.name() == name)
        .cloned()
}

impl InMemoryAgentClient {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Seeding (keeps caller-supplied names, no duplicate check)
    // ========================================================================

    pub fn seed_flow(&self, agent: &str, flow: Flow) -> Flow {
        seed(&mut self.store.lock().flows, agent, ResourceCategory::Flows, flow)
    }

    pub fn seed_intent(&self, agent: &str, intent: Intent) -> Intent {
        seed(
            &mut self.store.lock().intents,
            agent,
            ResourceCategory::Intents,
            intent,
        )
    }

    pub fn seed_entity_type(&self, agent: &str, entity_type: EntityType) -> EntityType {
        seed(
            &mut self.store.lock().entity_types,
            agent,
            ResourceCategory::EntityTypes,
            entity_type,
        )
    }

    pub fn seed_webhook(&self, agent: &str, webhook: Webhook) -> Webhook {
        seed(
            &mut self.store.lock().webhooks,
            agent,
            ResourceCategory::Webhooks,
            webhook,
        )
    }

    pub fn seed_page(&self, flow: &str, page: Page) -> Page {
        seed(&mut self.store.lock().pages, flow, ResourceCategory::Pages, page)
    }

    pub fn seed_route_group(&self, flow: &str, route_group: TransitionRouteGroup) -> TransitionRouteGroup {
        seed(
            &mut self.store.lock().route_groups,
            flow,
            ResourceCategory::RouteGroups,
            route_group,
        )
    }

    // ========================================================================
    // Test hooks
    // ========================================================================

    /// Make every create of `category` fail with `error`
    pub fn fail_creates(&self, category: ResourceCategory, error: ClientError) {
        self.store.lock().create_failures.insert(category, error);
    }

    /// Number of list calls served so far
    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of create calls received so far (including failed ones)
    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn count_list(&self) {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_create(&self, store: &Store, category: ResourceCategory) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        match store.create_failures.get(&category) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AgentClient for InMemoryAgentClient {
    async fn list_flows(&self, agent: &str) -> Result<Vec<Flow>> {
        self.count_list();
        Ok(list(&self.store.lock().flows, agent))
    }

    async fn list_intents(&self, agent: &str) -> Result<Vec<Intent>> {
        self.count_list();
        Ok(list(&self.store.lock().intents, agent))
    }

    async fn list_entity_types(&self, agent: &str) -> Result<Vec<EntityType>> {
        self.count_list();
        Ok(list(&self.store.lock().entity_types, agent))
    }

    async fn list_webhooks(&self, agent: &str) -> Result<Vec<Webhook>> {
        self.count_list();
        Ok(list(&self.store.lock().webhooks, agent))
    }

    async fn list_pages(&self, flow: &str) -> Result<Vec<Page>> {
        self.count_list();
        Ok(list(&self.store.lock().pages, flow))
    }

    async fn list_transition_route_groups(&self, flow: &str) -> Result<Vec<TransitionRouteGroup>> {
        self.count_list();
        Ok(list(&self.store.lock().route_groups, flow))
    }

    async fn get_intent(&self, name: &str) -> Result<Intent> {
        find(&self.store.lock().intents, name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn get_entity_type(&self, name: &str) -> Result<EntityType> {
        find(&self.store.lock().entity_types, name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn create_intent(&self, agent: &str, intent: &Intent) -> Result<Intent> {
        let mut store = self.store.lock();
        self.check_create(&store, ResourceCategory::Intents)?;
        insert(&mut store.intents, agent, ResourceCategory::Intents, intent)
    }

    async fn create_entity_type(
        &self,
        agent: &str,
        entity_type: &EntityType,
    ) -> Result<EntityType> {
        let mut store = self.store.lock();
        self.check_create(&store, ResourceCategory::EntityTypes)?;
        insert(
            &mut store.entity_types,
            agent,
            ResourceCategory::EntityTypes,
            entity_type,
        )
    }

    async fn create_webhook(&self, agent: &str, webhook: &Webhook) -> Result<Webhook> {
        let mut store = self.store.lock();
        self.check_create(&store, ResourceCategory::Webhooks)?;
        insert(&mut store.webhooks, agent, ResourceCategory::Webhooks, webhook)
    }

    async fn create_page(&self, flow: &str, page: &Page) -> Result<Page> {
        let mut store = self.store.lock();
        self.check_create(&store, ResourceCategory::Pages)?;
        insert(&mut store.pages, flow, ResourceCategory::Pages, page)
    }

    async fn create_transition_route_group(
        &self,
        flow: &str,
        route_group: &TransitionRouteGroup,
    ) -> Result<TransitionRouteGroup> {
        let mut store = self.store.lock();
        self.check_create(&store, ResourceCategory::RouteGroups)?;
        insert(
            &mut store.route_groups,
            flow,
            ResourceCategory::RouteGroups,
            route_group,
        )
    }
}
