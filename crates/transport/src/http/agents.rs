//! REST implementation of the agent-management collaborator

use std::sync::Arc;

use async_trait::async_trait;
use cx_porter_config::ApiConfig;
use cx_porter_core::{
    AgentClient, ClientError, EntityType, Flow, Intent, Page, Resource, ResourceCategory,
    TransitionRouteGroup, Webhook,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::HttpApi;
use crate::auth::TokenProvider;
use crate::error::TransportError;

type ClientResult<T> = std::result::Result<T, ClientError>;

/// Agent-management collaborator over the REST API
///
/// List calls follow `nextPageToken` until exhausted. Create calls send the
/// resource without its `name`; the service assigns one.
#[derive(Clone)]
pub struct RestAgentClient {
    api: HttpApi,
}

impl RestAgentClient {
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, TransportError> {
        Ok(Self {
            api: HttpApi::new(config, tokens)?,
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        parent: &str,
        category: ResourceCategory,
    ) -> ClientResult<Vec<T>> {
        let collection = category.collection();
        let url = self.api.endpoint().url(parent, &format!("/{}", collection));
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .api
                .client()
                .get(&url)
                .headers(self.api.headers().await?);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(TransportError::from)?;
            let mut body: Value = self.api.check(response)
                .await?
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

            if let Some(page) = body.get_mut(collection).map(Value::take) {
                let page: Vec<T> = serde_json::from_value(page)
                    .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", collection, e)))?;
                items.extend(page);
            }

            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(
            category = %category,
            parent = %parent,
            count = items.len(),
            "Listed resources"
        );
        Ok(items)
    }

    async fn get<T: DeserializeOwned>(&self, name: &str) -> ClientResult<T> {
        let url = self.api.endpoint().url(name, "");
        let response = self
            .api
            .client()
            .get(&url)
            .headers(self.api.headers().await?)
            .send()
            .await
            .map_err(TransportError::from)?;

        self.api.check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn create<T>(&self, parent: &str, category: ResourceCategory, resource: &T) -> ClientResult<T>
    where
        T: Resource + Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let mut body = resource.clone();
        body.set_name(String::new());

        let url = self
            .api
            .endpoint()
            .url(parent, &format!("/{}", category.collection()));
        let response = self
            .api
            .client()
            .post(&url)
            .headers(self.api.headers().await?)
            .json(&body)
            .send()
            .await
            .map_err(TransportError::from)?;

        let created: T = self.api.check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            category = %category,
            name = %created.name(),
            display_name = %created.display_name(),
            "Created resource"
        );
        Ok(created)
    }
}

#[async_trait]
impl AgentClient for RestAgentClient {
    async fn list_flows(&self, agent: &str) -> ClientResult<Vec<Flow>> {
        self.list(agent, ResourceCategory::Flows).await
    }

    async fn list_intents(&self, agent: &str) -> ClientResult<Vec<Intent>> {
        self.list(agent, ResourceCategory::Intents).await
    }

    async fn list_entity_types(&self, agent: &str) -> ClientResult<Vec<EntityType>> {
        self.list(agent, ResourceCategory::EntityTypes).await
    }

    async fn list_webhooks(&self, agent: &str) -> ClientResult<Vec<Webhook>> {
        self.list(agent, ResourceCategory::Webhooks).await
    }

    async fn list_pages(&self, flow: &str) -> ClientResult<Vec<Page>> {
        self.list(flow, ResourceCategory::Pages).await
    }

    async fn list_transition_route_groups(
        &self,
        flow: &str,
    ) -> ClientResult<Vec<TransitionRouteGroup>> {
        self.list(flow, ResourceCategory::RouteGroups).await
    }

    async fn get_intent(&self, name: &str) -> ClientResult<Intent> {
        self.get(name).await
    }

    async fn get_entity_type(&self, name: &str) -> ClientResult<EntityType> {
        self.get(name).await
    }

    async fn create_intent(&self, agent: &str, intent: &Intent) -> ClientResult<Intent> {
        self.create(agent, ResourceCategory::Intents, intent).await
    }

    async fn create_entity_type(
        &self,
        agent: &str,
        entity_type: &EntityType,
    ) -> ClientResult<EntityType> {
        self.create(agent, ResourceCategory::EntityTypes, entity_type)
            .await
    }

    async fn create_webhook(&self, agent: &str, webhook: &Webhook) -> ClientResult<Webhook> {
        self.create(agent, ResourceCategory::Webhooks, webhook).await
    }

    async fn create_page(&self, flow: &str, page: &Page) -> ClientResult<Page> {
        self.create(flow, ResourceCategory::Pages, page).await
    }

    async fn create_transition_route_group(
        &self,
        flow: &str,
        route_group: &TransitionRouteGroup,
    ) -> ClientResult<TransitionRouteGroup> {
        self.create(flow, ResourceCategory::RouteGroups, route_group)
            .await
    }
}
