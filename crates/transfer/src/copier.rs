//! Agent-to-agent copy orchestration
//!
//! Copies selected webhooks, entity types, intents and route groups from a
//! source agent into a destination agent:
//!
//! ```text
//! collect:  entity types → intents → webhooks → route groups (source flow)
//! create:   webhooks → entity types → intents (paced) → route groups (destination flow)
//! ```
//!
//! Webhooks and entity types are created as fetched. Intent parameter entity
//! types and every route-group reference go through a Source rewriter on the
//! source agent and a Destination rewriter on the destination agent.
//!
//! Every create is guarded on its own: a duplicate display name is recorded
//! as `SkippedDuplicate`, any other creation or rewrite failure as `Failed`,
//! and the run moves on. Failures to list or resolve indexes abort the run.

use std::sync::Arc;
use std::time::Duration;

use cx_porter_config::TransferConfig;
use cx_porter_config::constants::transfer::{DEFAULT_FLOW, PACING_MS};
use cx_porter_core::{
    AgentClient, ClientError, CopyEvent, CopyObserver, EntityType, Intent, ResourceCategory,
    TracingObserver, TransitionRouteGroup, Webhook,
};
use cx_porter_remap::{
    build_index, Direction, RemapError, ResourceSelection, RewriteContext, Rewriter,
};

use crate::error::{Result, TransferError};
use crate::report::{CopyOutcome, CopyReport};

/// Copies resources between agents through one collaborator
pub struct AgentCopier {
    client: Arc<dyn AgentClient>,
    observer: Arc<dyn CopyObserver>,
    pacing: Duration,
    source_flow: String,
    destination_flow: String,
}

impl AgentCopier {
    /// Copier with a tracing observer, one-second pacing and the default flow
    pub fn new(client: Arc<dyn AgentClient>) -> Self {
        Self {
            client,
            observer: Arc::new(TracingObserver),
            pacing: Duration::from_millis(PACING_MS),
            source_flow: DEFAULT_FLOW.to_string(),
            destination_flow: DEFAULT_FLOW.to_string(),
        }
    }

    pub fn from_config(client: Arc<dyn AgentClient>, config: &TransferConfig) -> Self {
        Self::new(client)
            .with_pacing(Duration::from_millis(config.pacing_ms))
            .with_source_flow(config.source_flow.clone())
            .with_destination_flow(config.destination_flow.clone())
    }

    pub fn with_observer(mut self, observer: Arc<dyn CopyObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Delay before each intent creation in `copy_resources`
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Source flow whose route groups are collected
    pub fn with_source_flow(mut self, flow: impl Into<String>) -> Self {
        self.source_flow = flow.into();
        self
    }

    /// Destination flow used by the `*_configured_flow` operations
    pub fn with_destination_flow(mut self, flow: impl Into<String>) -> Self {
        self.destination_flow = flow.into();
        self
    }

    pub fn destination_flow(&self) -> &str {
        &self.destination_flow
    }

    pub fn client(&self) -> &Arc<dyn AgentClient> {
        &self.client
    }

    pub fn observer(&self) -> &Arc<dyn CopyObserver> {
        &self.observer
    }

    /// Record a creation attempt and notify the observer
    pub(crate) fn record<T>(
        &self,
        report: &mut CopyReport,
        category: ResourceCategory,
        display_name: &str,
        result: std::result::Result<T, ClientError>,
    ) -> CopyOutcome {
        let (outcome, event) = match result {
            Ok(_) => (
                CopyOutcome::Created,
                CopyEvent::Created {
                    category,
                    display_name: display_name.to_string(),
                },
            ),
            Err(err) if err.is_already_exists() => (
                CopyOutcome::SkippedDuplicate,
                CopyEvent::SkippedDuplicate {
                    category,
                    display_name: display_name.to_string(),
                },
            ),
            Err(err) => (
                CopyOutcome::Failed(err.to_string()),
                CopyEvent::CreationFailed {
                    category,
                    display_name: display_name.to_string(),
                    reason: err.to_string(),
                },
            ),
        };
        self.observer.notify(&event);
        report.push(category, display_name, outcome.clone());
        outcome
    }

    /// Record a resource whose references could not be rewritten
    fn record_rewrite_failure(
        &self,
        report: &mut CopyReport,
        category: ResourceCategory,
        display_name: &str,
        err: &RemapError,
    ) -> CopyOutcome {
        let outcome = CopyOutcome::Failed(err.to_string());
        self.observer.notify(&CopyEvent::CreationFailed {
            category,
            display_name: display_name.to_string(),
            reason: err.to_string(),
        });
        report.push(category, display_name, outcome.clone());
        outcome
    }

    /// Identifier of a flow by display name
    pub(crate) async fn resolve_flow(&self, agent: &str, display_name: &str) -> Result<String> {
        let flows = build_index(self.client.as_ref(), agent, ResourceCategory::Flows, true).await?;
        flows
            .get(display_name)
            .map(str::to_string)
            .ok_or_else(|| RemapError::FlowNotFound(display_name.to_string()).into())
    }

    /// Rewriters translating entity-type references from `source` to `destination`
    async fn entity_rewriters(&self, source: &str, destination: &str) -> Result<(Rewriter, Rewriter)> {
        let client = self.client.as_ref();
        let source_entities = build_index(client, source, ResourceCategory::EntityTypes, false).await?;
        let destination_entities =
            build_index(client, destination, ResourceCategory::EntityTypes, true).await?;
        destination_entities.report_collisions(self.observer.as_ref());

        let to_portable = Rewriter::new(
            RewriteContext::new(Direction::Source, "").with_index(source_entities),
            self.observer.clone(),
        );
        let to_destination = Rewriter::new(
            RewriteContext::new(Direction::Destination, "").with_index(destination_entities),
            self.observer.clone(),
        );
        Ok((to_portable, to_destination))
    }

    /// Copy every selected resource not in a skipped category
    ///
    /// `destination_flow` is the display name of the flow receiving route
    /// groups. Route groups are always collected from the copier's source
    /// flow.
    pub async fn copy_resources(
        &self,
        selection: &ResourceSelection,
        source_agent: &str,
        destination_agent: &str,
        destination_flow: &str,
        skip: &[ResourceCategory],
    ) -> Result<CopyReport> {
        let client = self.client.as_ref();
        let wanted = |category: ResourceCategory| !skip.contains(&category);
        let mut report = CopyReport::new();

        // Collect
        let entity_types: Vec<EntityType> = if wanted(ResourceCategory::EntityTypes) {
            client
                .list_entity_types(source_agent)
                .await?
                .into_iter()
                .filter(|e| selection.contains(ResourceCategory::EntityTypes, &e.name))
                .collect()
        } else {
            Vec::new()
        };

        let intents: Vec<Intent> = if wanted(ResourceCategory::Intents) {
            client
                .list_intents(source_agent)
                .await?
                .into_iter()
                .filter(|i| selection.contains(ResourceCategory::Intents, &i.name))
                .collect()
        } else {
            Vec::new()
        };

        let webhooks: Vec<Webhook> = if wanted(ResourceCategory::Webhooks) {
            client
                .list_webhooks(source_agent)
                .await?
                .into_iter()
                .filter(|w| selection.contains(ResourceCategory::Webhooks, &w.name))
                .collect()
        } else {
            Vec::new()
        };

        let route_groups: Vec<TransitionRouteGroup> = if wanted(ResourceCategory::RouteGroups)
            && selection.count(ResourceCategory::RouteGroups) > 0
        {
            let source_flow = self.resolve_flow(source_agent, &self.source_flow).await?;
            client
                .list_transition_route_groups(&source_flow)
                .await?
                .into_iter()
                .filter(|rg| selection.contains(ResourceCategory::RouteGroups, &rg.name))
                .collect()
        } else {
            Vec::new()
        };

        tracing::info!(
            source = %source_agent,
            destination = %destination_agent,
            webhooks = webhooks.len(),
            entity_types = entity_types.len(),
            intents = intents.len(),
            route_groups = route_groups.len(),
            "Copying agent resources"
        );

        // Create
        for webhook in &webhooks {
            let result = client.create_webhook(destination_agent, webhook).await;
            self.record(&mut report, ResourceCategory::Webhooks, &webhook.display_name, result);
        }

        for entity_type in &entity_types {
            let result = client.create_entity_type(destination_agent, entity_type).await;
            self.record(
                &mut report,
                ResourceCategory::EntityTypes,
                &entity_type.display_name,
                result,
            );
        }

        if !intents.is_empty() {
            let (to_portable, to_destination) =
                self.entity_rewriters(source_agent, destination_agent).await?;

            for intent in &intents {
                tokio::time::sleep(self.pacing).await;

                let rewritten = to_portable
                    .rewrite_intent(intent)
                    .and_then(|portable| to_destination.rewrite_intent(&portable));
                match rewritten {
                    Ok(intent) => {
                        let result = client.create_intent(destination_agent, &intent).await;
                        self.record(&mut report, ResourceCategory::Intents, &intent.display_name, result);
                    }
                    Err(err) => {
                        self.record_rewrite_failure(
                            &mut report,
                            ResourceCategory::Intents,
                            &intent.display_name,
                            &err,
                        );
                    }
                }
            }
        }

        if !route_groups.is_empty() {
            let observer = self.observer.as_ref();
            let to_portable = Rewriter::new(
                RewriteContext::load(client, source_agent, &self.source_flow, Direction::Source, observer)
                    .await?,
                self.observer.clone(),
            );
            let to_destination = Rewriter::new(
                RewriteContext::load(
                    client,
                    destination_agent,
                    destination_flow,
                    Direction::Destination,
                    observer,
                )
                .await?,
                self.observer.clone(),
            );
            let target_flow = to_destination.context().flow().to_string();

            for group in &route_groups {
                let rewritten = to_portable
                    .rewrite_route_group(group)
                    .and_then(|portable| to_destination.rewrite_route_group(&portable));
                match rewritten {
                    Ok(group) => {
                        let result = client.create_transition_route_group(&target_flow, &group).await;
                        self.record(&mut report, ResourceCategory::RouteGroups, &group.display_name, result);
                    }
                    Err(err) => {
                        self.record_rewrite_failure(
                            &mut report,
                            ResourceCategory::RouteGroups,
                            &group.display_name,
                            &err,
                        );
                    }
                }
            }
        }

        tracing::info!(
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Copy finished"
        );

        Ok(report)
    }

    /// `copy_resources` into the copier's destination flow
    pub async fn copy_resources_to_configured_flow(
        &self,
        selection: &ResourceSelection,
        source_agent: &str,
        destination_agent: &str,
        skip: &[ResourceCategory],
    ) -> Result<CopyReport> {
        self.copy_resources(
            selection,
            source_agent,
            destination_agent,
            &self.destination_flow,
            skip,
        )
        .await
    }

    /// Copy one intent by display name
    ///
    /// Entity-type parameters are translated through the source and
    /// destination entity indexes; built-in types are kept.
    pub async fn copy_intent_to_agent(
        &self,
        display_name: &str,
        source_agent: &str,
        destination_agent: &str,
    ) -> Result<CopyOutcome> {
        let client = self.client.as_ref();
        let intents = build_index(client, source_agent, ResourceCategory::Intents, true).await?;
        let id = intents
            .get(display_name)
            .ok_or_else(|| TransferError::NotFound(format!("intent '{}'", display_name)))?;
        let intent = client.get_intent(id).await?;

        let mut report = CopyReport::new();
        let rewritten = if intent.parameters.is_empty() {
            Ok(intent)
        } else {
            let (to_portable, to_destination) =
                self.entity_rewriters(source_agent, destination_agent).await?;
            to_portable
                .rewrite_intent(&intent)
                .and_then(|portable| to_destination.rewrite_intent(&portable))
        };

        let outcome = match rewritten {
            Ok(intent) => {
                let result = client.create_intent(destination_agent, &intent).await;
                self.record(&mut report, ResourceCategory::Intents, display_name, result)
            }
            Err(err) => {
                self.record_rewrite_failure(&mut report, ResourceCategory::Intents, display_name, &err)
            }
        };
        Ok(outcome)
    }

    /// Copy one entity type by display name
    pub async fn copy_entity_type_to_agent(
        &self,
        display_name: &str,
        source_agent: &str,
        destination_agent: &str,
    ) -> Result<CopyOutcome> {
        let client = self.client.as_ref();
        let entity_types =
            build_index(client, source_agent, ResourceCategory::EntityTypes, true).await?;
        let id = entity_types
            .get(display_name)
            .ok_or_else(|| TransferError::NotFound(format!("entity type '{}'", display_name)))?;
        let entity_type = client.get_entity_type(id).await?;

        let mut report = CopyReport::new();
        let result = client.create_entity_type(destination_agent, &entity_type).await;
        Ok(self.record(&mut report, ResourceCategory::EntityTypes, display_name, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cx_porter_core::{Flow, InMemoryAgentClient, IntentParameter, RecordingObserver};

    const SRC: &str = "projects/p/locations/global/agents/src";
    const DST: &str = "projects/p/locations/global/agents/dst";

    fn copier(client: Arc<InMemoryAgentClient>) -> (AgentCopier, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let copier = AgentCopier::new(client)
            .with_observer(observer.clone())
            .with_pacing(Duration::ZERO);
        (copier, observer)
    }

    #[tokio::test]
    async fn test_copy_intent_translates_entity_parameters() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_entity_type(SRC, EntityType::new(format!("{SRC}/entityTypes/e1"), "size"));
        client.seed_entity_type(DST, EntityType::new(format!("{DST}/entityTypes/e9"), "size"));
        let mut intent = Intent::new(format!("{SRC}/intents/i1"), "Order Pizza");
        intent.parameters = vec![
            IntentParameter {
                id: "size".to_string(),
                entity_type: format!("{SRC}/entityTypes/e1"),
                ..Default::default()
            },
            IntentParameter {
                id: "count".to_string(),
                entity_type: "projects/-/locations/-/agents/-/entityTypes/sys.number".to_string(),
                ..Default::default()
            },
        ];
        client.seed_intent(SRC, intent);

        let (copier, observer) = copier(client.clone());
        let outcome = copier
            .copy_intent_to_agent("Order Pizza", SRC, DST)
            .await
            .unwrap();
        assert_eq!(outcome, CopyOutcome::Created);

        let copied = client.list_intents(DST).await.unwrap();
        assert_eq!(copied[0].parameters[0].entity_type, format!("{DST}/entityTypes/e9"));
        assert!(copied[0].parameters[1].entity_type.ends_with("sys.number"));
        assert_eq!(observer.count(|e| matches!(e, CopyEvent::Created { .. })), 1);

        // Second copy is a duplicate
        let again = copier.copy_intent_to_agent("Order Pizza", SRC, DST).await.unwrap();
        assert_eq!(again, CopyOutcome::SkippedDuplicate);
    }

    #[tokio::test]
    async fn test_copy_intent_with_missing_destination_entity_fails() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_entity_type(SRC, EntityType::new(format!("{SRC}/entityTypes/e1"), "size"));
        let mut intent = Intent::new(format!("{SRC}/intents/i1"), "Order Pizza");
        intent.parameters = vec![IntentParameter {
            id: "size".to_string(),
            entity_type: format!("{SRC}/entityTypes/e1"),
            ..Default::default()
        }];
        client.seed_intent(SRC, intent);

        let (copier, observer) = copier(client.clone());
        let outcome = copier.copy_intent_to_agent("Order Pizza", SRC, DST).await.unwrap();
        assert!(outcome.is_failed());
        assert!(client.list_intents(DST).await.unwrap().is_empty());
        assert_eq!(
            observer.count(|e| matches!(e, CopyEvent::LookupMiss { category: ResourceCategory::EntityTypes, key } if key == "size")),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_display_name_is_not_found() {
        let client = Arc::new(InMemoryAgentClient::new());
        let (copier, _) = copier(client);
        let err = copier
            .copy_entity_type_to_agent("size", SRC, DST)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_entity_type() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_entity_type(SRC, EntityType::new(format!("{SRC}/entityTypes/e1"), "size"));
        let (copier, _) = copier(client.clone());

        let outcome = copier.copy_entity_type_to_agent("size", SRC, DST).await.unwrap();
        assert_eq!(outcome, CopyOutcome::Created);
        assert_eq!(client.list_entity_types(DST).await.unwrap()[0].display_name, "size");
    }

    #[tokio::test]
    async fn test_other_creation_errors_are_failed_not_skipped() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_webhook(SRC, Webhook::new(format!("{SRC}/webhooks/w1"), "OrderWebhook"));
        client.seed_webhook(SRC, Webhook::new(format!("{SRC}/webhooks/w2"), "PaymentWebhook"));
        client.fail_creates(
            ResourceCategory::Webhooks,
            ClientError::Api {
                status: 500,
                message: "backend unavailable".to_string(),
            },
        );

        let (copier, observer) = copier(client.clone());
        let selection = ResourceSelection::new().with(
            ResourceCategory::Webhooks,
            [format!("{SRC}/webhooks/w1"), format!("{SRC}/webhooks/w2")],
        );
        let report = copier
            .copy_resources(&selection, SRC, DST, DEFAULT_FLOW, &[])
            .await
            .unwrap();

        // Both attempted, both failed, run completed
        assert_eq!(report.failed(), 2);
        assert_eq!(client.create_call_count(), 2);
        assert_eq!(
            observer.count(|e| matches!(e, CopyEvent::CreationFailed { .. })),
            2
        );
    }

    #[tokio::test]
    async fn test_skip_list_and_unselected_resources() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_webhook(SRC, Webhook::new(format!("{SRC}/webhooks/w1"), "OrderWebhook"));
        client.seed_webhook(SRC, Webhook::new(format!("{SRC}/webhooks/w2"), "Unselected"));
        client.seed_entity_type(SRC, EntityType::new(format!("{SRC}/entityTypes/e1"), "size"));

        let (copier, _) = copier(client.clone());
        let selection = ResourceSelection::new()
            .with(ResourceCategory::Webhooks, [format!("{SRC}/webhooks/w1")])
            .with(ResourceCategory::EntityTypes, [format!("{SRC}/entityTypes/e1")]);
        let report = copier
            .copy_resources(&selection, SRC, DST, DEFAULT_FLOW, &[ResourceCategory::EntityTypes])
            .await
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(client.list_webhooks(DST).await.unwrap().len(), 1);
        assert!(client.list_entity_types(DST).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_flow_aborts_route_group_copy() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_flow(DST, Flow::new(format!("{DST}/flows/f9"), DEFAULT_FLOW));

        let (copier, _) = copier(client);
        let selection = ResourceSelection::new()
            .with(ResourceCategory::RouteGroups, [format!("{SRC}/flows/f1/transitionRouteGroups/rg1")]);
        let err = copier
            .copy_resources(&selection, SRC, DST, DEFAULT_FLOW, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Remap(RemapError::FlowNotFound(_))));
    }

    #[tokio::test]
    async fn test_configured_destination_flow_receives_route_groups() {
        let client = Arc::new(InMemoryAgentClient::new());
        let src_flow = format!("{SRC}/flows/f1");
        let billing = format!("{DST}/flows/f8");
        client.seed_flow(SRC, Flow::new(src_flow.clone(), DEFAULT_FLOW));
        client.seed_flow(DST, Flow::new(format!("{DST}/flows/f9"), DEFAULT_FLOW));
        client.seed_flow(DST, Flow::new(billing.clone(), "Billing"));
        client.seed_route_group(
            &src_flow,
            TransitionRouteGroup::new(format!("{src_flow}/transitionRouteGroups/rg1"), "Payments"),
        );

        let config = TransferConfig {
            pacing_ms: 0,
            source_flow: DEFAULT_FLOW.to_string(),
            destination_flow: "Billing".to_string(),
        };
        let copier = AgentCopier::from_config(client.clone(), &config)
            .with_observer(Arc::new(cx_porter_core::NoopObserver));
        assert_eq!(copier.destination_flow(), "Billing");

        let selection = ResourceSelection::new().with(
            ResourceCategory::RouteGroups,
            [format!("{src_flow}/transitionRouteGroups/rg1")],
        );
        let report = copier
            .copy_resources_to_configured_flow(&selection, SRC, DST, &[])
            .await
            .unwrap();
        assert_eq!(report.created(), 1);
        assert_eq!(client.list_transition_route_groups(&billing).await.unwrap().len(), 1);
        assert!(client
            .list_transition_route_groups(&format!("{DST}/flows/f9"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_intents_are_paced() {
        let client = Arc::new(InMemoryAgentClient::new());
        client.seed_intent(SRC, Intent::new(format!("{SRC}/intents/i1"), "Order Pizza"));
        client.seed_intent(SRC, Intent::new(format!("{SRC}/intents/i2"), "Cancel Order"));

        let copier = AgentCopier::new(client.clone())
            .with_observer(Arc::new(cx_porter_core::NoopObserver))
            .with_pacing(Duration::from_secs(1));
        let selection = ResourceSelection::new().with(
            ResourceCategory::Intents,
            [format!("{SRC}/intents/i1"), format!("{SRC}/intents/i2")],
        );

        let start = tokio::time::Instant::now();
        let report = copier
            .copy_resources(&selection, SRC, DST, DEFAULT_FLOW, &[])
            .await
            .unwrap();
        assert_eq!(report.created(), 2);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
