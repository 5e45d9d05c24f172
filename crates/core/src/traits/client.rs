//! Agent-management collaborator

use crate::resources::{EntityType, Flow, Intent, Page, TransitionRouteGroup, Webhook};
use crate::Result;
use async_trait::async_trait;

/// CRUD surface of the agent-management service
///
/// Implementations:
/// - `InMemoryAgentClient` - process-local store for tests and dry runs
/// - `RestAgentClient` (transport crate) - the REST API over reqwest
///
/// Agent-scoped calls take an agent identifier as `parent`; page and route
/// group calls take a flow identifier. Create calls ignore the `name` of the
/// supplied resource and return the stored resource with its assigned name.
///
/// # Example
///
/// ```ignore
/// let client: Arc<dyn AgentClient> = Arc::new(InMemoryAgentClient::new());
/// let intents = client.list_intents(agent).await?;
/// ```
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn list_flows(&self, agent: &str) -> Result<Vec<Flow>>;

    async fn list_intents(&self, agent: &str) -> Result<Vec<Intent>>;

    async fn list_entity_types(&self, agent: &str) -> Result<Vec<EntityType>>;

    async fn list_webhooks(&self, agent: &str) -> Result<Vec<Webhook>>;

    async fn list_pages(&self, flow: &str) -> Result<Vec<Page>>;

    async fn list_transition_route_groups(&self, flow: &str) -> Result<Vec<TransitionRouteGroup>>;

    /// Fetch a single intent by identifier
    async fn get_intent(&self, name: &str) -> Result<Intent>;

    /// Fetch a single entity type by identifier
    async fn get_entity_type(&self, name: &str) -> Result<EntityType>;

    async fn create_intent(&self, agent: &str, intent: &Intent) -> Result<Intent>;

    async fn create_entity_type(&self, agent: &str, entity_type: &EntityType)
        -> Result<EntityType>;

    async fn create_webhook(&self, agent: &str, webhook: &Webhook) -> Result<Webhook>;

    async fn create_page(&self, flow: &str, page: &Page) -> Result<Page>;

    async fn create_transition_route_group(
        &self,
        flow: &str,
        route_group: &TransitionRouteGroup,
    ) -> Result<TransitionRouteGroup>;
}
