//! Integration tests for agent-to-agent copies
//!
//! A source agent with one flow, two pages and a route group is copied into
//! an empty destination agent through the in-memory collaborator.

use std::sync::Arc;
use std::time::Duration;

use cx_porter_core::{
    AgentClient, CopyEvent, EntityType, EventHandler, FillBehavior, Flow, Form, FormParameter,
    Fulfillment, InMemoryAgentClient, Intent, IntentParameter, Page, RecordingObserver,
    ResourceCategory, TransitionRoute, TransitionRouteGroup, Webhook,
};
use cx_porter_remap::{
    build_index, convert_page_dependencies, extract_dependencies, Direction, ResourceSelection,
};
use cx_porter_transfer::{page_shell_names, AgentCopier, CopyOutcome, CopyReport};

const SRC: &str = "projects/p/locations/global/agents/src";
const SRC_FLOW: &str = "projects/p/locations/global/agents/src/flows/f1";
const DST: &str = "projects/p/locations/global/agents/dst";
const DST_FLOW: &str = "projects/p/locations/global/agents/dst/flows/f9";
const FLOW_NAME: &str = "Default Start Flow";

fn src(path: &str) -> String {
    format!("{SRC}/{path}")
}

fn src_page(id: &str) -> String {
    format!("{SRC_FLOW}/pages/{id}")
}

/// Seed both agents and return the source pages
fn seed_agents(client: &InMemoryAgentClient) -> Vec<Page> {
    client.seed_flow(SRC, Flow::new(SRC_FLOW, FLOW_NAME));
    client.seed_flow(DST, Flow::new(DST_FLOW, FLOW_NAME));

    client.seed_webhook(SRC, Webhook::new(src("webhooks/w1"), "OrderWebhook"));
    client.seed_webhook(SRC, Webhook::new(src("webhooks/w2"), "PaymentWebhook"));
    client.seed_entity_type(SRC, EntityType::new(src("entityTypes/e1"), "size"));

    let mut order = Intent::new(src("intents/i1"), "Order Pizza");
    order.parameters = vec![IntentParameter {
        id: "size".to_string(),
        entity_type: src("entityTypes/e1"),
        ..Default::default()
    }];
    client.seed_intent(SRC, order);
    client.seed_intent(SRC, Intent::new(src("intents/i2"), "Cancel Order"));

    let mut ordering = TransitionRouteGroup::new(format!("{SRC_FLOW}/transitionRouteGroups/rg1"), "Ordering");
    ordering.transition_routes = vec![
        TransitionRoute::on_intent(src("intents/i1"))
            .with_target_page(src_page("p2"))
            .with_webhook(src("webhooks/w1")),
        TransitionRoute::on_intent(src("intents/i2")).with_target_page(src_page("END_FLOW")),
    ];
    client.seed_route_group(SRC_FLOW, ordering);

    let mut size = FormParameter::new("size", src("entityTypes/e1"));
    size.required = true;
    size.fill_behavior = Some(FillBehavior {
        initial_prompt_fulfillment: Some(Fulfillment::webhook(src("webhooks/w1"))),
        reprompt_event_handlers: vec![
            EventHandler::on_event("sys.no-match-1").with_webhook(src("webhooks/w2"))
        ],
        ..Default::default()
    });
    let count = FormParameter::new("count", "projects/-/locations/-/agents/-/entityTypes/sys.number");

    let mut collect = Page::new(src_page("p1"), "Collect Size");
    collect.entry_fulfillment = Some(Fulfillment::webhook(src("webhooks/w1")));
    collect.form = Some(Form {
        parameters: vec![size, count],
        ..Default::default()
    });
    collect.transition_routes = vec![TransitionRoute::on_condition("$page.params.status = \"FINAL\"")
        .with_target_page(src_page("p2"))
        .with_webhook(src("webhooks/w2"))];
    collect.transition_route_groups = vec![format!("{SRC_FLOW}/transitionRouteGroups/rg1")];

    let mut confirm = Page::new(src_page("p2"), "Confirm");
    confirm.event_handlers =
        vec![EventHandler::on_event("sys.no-match-default").with_target_page(src_page("CURRENT_PAGE"))];
    confirm.transition_routes =
        vec![TransitionRoute::on_intent(src("intents/i2")).with_target_page(src_page("END_SESSION"))];

    let pages = vec![collect, confirm];
    for page in &pages {
        client.seed_page(SRC_FLOW, page.clone());
    }
    pages
}

fn copier(client: Arc<InMemoryAgentClient>) -> (AgentCopier, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::new());
    let copier = AgentCopier::new(client)
        .with_observer(observer.clone())
        .with_pacing(Duration::ZERO);
    (copier, observer)
}

/// Shells first, then every dependency of `pages`
async fn copy_all(copier: &AgentCopier, client: &InMemoryAgentClient, pages: &[Page]) -> CopyReport {
    let selection = extract_dependencies(client, pages).await.unwrap();
    let mut report = copier
        .create_page_shells(page_shell_names(pages).as_slice(), DST, FLOW_NAME)
        .await
        .unwrap();
    report.merge(
        copier
            .copy_resources(&selection, SRC, DST, FLOW_NAME, &[])
            .await
            .unwrap(),
    );
    report
}

async fn dst_id(client: &InMemoryAgentClient, category: ResourceCategory, display_name: &str) -> String {
    let parent = if category.is_flow_scoped() { DST_FLOW } else { DST };
    build_index(client, parent, category, true)
        .await
        .unwrap()
        .get(display_name)
        .unwrap()
        .to_string()
}

/// Test that every dependency lands in the destination with translated references
#[tokio::test]
async fn test_full_copy_translates_references() {
    let client = Arc::new(InMemoryAgentClient::new());
    let pages = seed_agents(&client);
    let (copier, _) = copier(client.clone());

    let report = copy_all(&copier, &client, &pages).await;
    // 2 shells, 2 webhooks, 1 entity type, 2 intents, 1 route group
    assert_eq!(report.created(), 8);
    assert!(report.is_clean());

    let order_webhook = dst_id(&client, ResourceCategory::Webhooks, "OrderWebhook").await;
    let size = dst_id(&client, ResourceCategory::EntityTypes, "size").await;
    let order_pizza = dst_id(&client, ResourceCategory::Intents, "Order Pizza").await;
    let confirm = dst_id(&client, ResourceCategory::Pages, "Confirm").await;

    let intents = client.list_intents(DST).await.unwrap();
    let copied = intents.iter().find(|i| i.display_name == "Order Pizza").unwrap();
    assert_eq!(copied.parameters[0].entity_type, size);

    let groups = client.list_transition_route_groups(DST_FLOW).await.unwrap();
    assert_eq!(groups.len(), 1);
    let routes = &groups[0].transition_routes;
    assert_eq!(routes[0].intent.as_deref(), Some(order_pizza.as_str()));
    assert_eq!(routes[0].target_page.as_deref(), Some(confirm.as_str()));
    assert_eq!(routes[0].webhook(), Some(order_webhook.as_str()));
    assert_eq!(
        routes[1].target_page.as_deref(),
        Some(format!("{DST_FLOW}/pages/END_FLOW").as_str())
    );
}

/// Test that pages survive source → destination → source unchanged in shape
#[tokio::test]
async fn test_page_round_trip() {
    let client = Arc::new(InMemoryAgentClient::new());
    let pages = seed_agents(&client);
    let original = pages.clone();
    let (copier, observer) = copier(client.clone());
    copy_all(&copier, &client, &pages).await;

    let portable = convert_page_dependencies(
        client.as_ref(),
        SRC,
        &pages,
        Direction::Source,
        FLOW_NAME,
        observer.clone(),
    )
    .await
    .unwrap();
    assert_eq!(pages, original);

    let collect = &portable[0];
    assert_eq!(collect.entry_fulfillment.as_ref().unwrap().webhook.as_deref(), Some("OrderWebhook"));
    assert_eq!(collect.transition_routes[0].target_page.as_deref(), Some("Confirm"));
    assert_eq!(collect.transition_route_groups, vec!["Ordering".to_string()]);
    assert_eq!(collect.form_parameters()[0].entity_type, "size");
    assert!(collect.form_parameters()[1].entity_type.ends_with("sys.number"));
    assert_eq!(portable[1].event_handlers[0].target_page.as_deref(), Some("CURRENT_PAGE"));

    let destination = convert_page_dependencies(
        client.as_ref(),
        DST,
        &portable,
        Direction::Destination,
        FLOW_NAME,
        observer.clone(),
    )
    .await
    .unwrap();

    let collect = &destination[0];
    assert_eq!(collect.name, dst_id(&client, ResourceCategory::Pages, "Collect Size").await);
    assert_eq!(
        collect.entry_fulfillment.as_ref().unwrap().webhook,
        Some(dst_id(&client, ResourceCategory::Webhooks, "OrderWebhook").await)
    );
    assert_eq!(
        collect.transition_route_groups,
        vec![dst_id(&client, ResourceCategory::RouteGroups, "Ordering").await]
    );
    assert_eq!(
        collect.form_parameters()[0].entity_type,
        dst_id(&client, ResourceCategory::EntityTypes, "size").await
    );
    let reprompt = &collect.form_parameters()[0]
        .fill_behavior
        .as_ref()
        .unwrap()
        .reprompt_event_handlers[0];
    assert_eq!(
        reprompt.webhook(),
        Some(dst_id(&client, ResourceCategory::Webhooks, "PaymentWebhook").await.as_str())
    );
    assert_eq!(
        destination[1].event_handlers[0].target_page,
        Some(format!("{DST_FLOW}/pages/CURRENT_PAGE"))
    );
    assert_eq!(
        destination[1].transition_routes[0].target_page,
        Some(format!("{DST_FLOW}/pages/END_SESSION"))
    );

    // Back to portable form from the destination side
    let back = convert_page_dependencies(
        client.as_ref(),
        DST,
        &destination,
        Direction::Source,
        FLOW_NAME,
        observer.clone(),
    )
    .await
    .unwrap();
    let strip = |pages: Vec<Page>| -> Vec<Page> {
        pages
            .into_iter()
            .map(|mut p| {
                p.name.clear();
                p
            })
            .collect()
    };
    assert_eq!(strip(back), strip(portable));
    assert_eq!(observer.count(|e| matches!(e, CopyEvent::LookupMiss { .. })), 0);
}

/// Test that a second identical copy creates nothing and fails nothing
#[tokio::test]
async fn test_repeated_copy_is_idempotent() {
    let client = Arc::new(InMemoryAgentClient::new());
    let pages = seed_agents(&client);
    let (copier, observer) = copier(client.clone());

    let first = copy_all(&copier, &client, &pages).await;
    observer.clear();
    let second = copy_all(&copier, &client, &pages).await;

    assert_eq!(second.len(), first.len());
    assert_eq!(second.created(), 0);
    assert_eq!(second.failed(), 0);
    assert_eq!(second.skipped(), second.len());
    assert!(second
        .records()
        .iter()
        .all(|r| r.outcome == CopyOutcome::SkippedDuplicate));
    assert_eq!(
        observer.count(|e| matches!(e, CopyEvent::SkippedDuplicate { .. })),
        second.len()
    );

    assert_eq!(client.list_webhooks(DST).await.unwrap().len(), 2);
    assert_eq!(client.list_entity_types(DST).await.unwrap().len(), 1);
    assert_eq!(client.list_intents(DST).await.unwrap().len(), 2);
    assert_eq!(client.list_pages(DST_FLOW).await.unwrap().len(), 2);
    assert_eq!(client.list_transition_route_groups(DST_FLOW).await.unwrap().len(), 1);
}

/// Test that extraction returns exactly the referenced resources
#[tokio::test]
async fn test_dependency_completeness() {
    let client = InMemoryAgentClient::new();
    let pages = seed_agents(&client);

    let mut page = Page::new(src_page("p7"), "Checkout");
    page.entry_fulfillment = Some(Fulfillment::webhook(src("webhooks/w1")));
    page.transition_routes = vec![TransitionRoute::on_intent(src("intents/i1")).with_webhook(src("webhooks/w2"))];
    page.form = Some(Form {
        parameters: vec![FormParameter::new("size", src("entityTypes/e1"))],
        ..Default::default()
    });
    page.transition_route_groups = vec![format!("{SRC_FLOW}/transitionRouteGroups/rg1")];

    let selection = extract_dependencies(&client, &[page]).await.unwrap();
    let expected = ResourceSelection::new()
        .with(ResourceCategory::Webhooks, [src("webhooks/w1"), src("webhooks/w2")])
        .with(ResourceCategory::EntityTypes, [src("entityTypes/e1")])
        .with(
            ResourceCategory::RouteGroups,
            [format!("{SRC_FLOW}/transitionRouteGroups/rg1")],
        )
        .with(ResourceCategory::Intents, [src("intents/i1"), src("intents/i2")]);
    assert_eq!(selection, expected);

    // The seeded pages reference the same set
    assert_eq!(extract_dependencies(&client, &pages).await.unwrap(), expected);
}

/// Test that references resolve to same-named destination resources
#[tokio::test]
async fn test_route_group_references_existing_destination_resources() {
    let client = Arc::new(InMemoryAgentClient::new());
    client.seed_flow(SRC, Flow::new(SRC_FLOW, FLOW_NAME));
    client.seed_flow(DST, Flow::new(DST_FLOW, FLOW_NAME));
    client.seed_intent(SRC, Intent::new(src("intents/i1"), "Order Pizza"));
    client.seed_webhook(SRC, Webhook::new(src("webhooks/w1"), "OrderWebhook"));
    client.seed_intent(DST, Intent::new(format!("{DST}/intents/i9"), "Order Pizza"));
    client.seed_webhook(DST, Webhook::new(format!("{DST}/webhooks/w9"), "OrderWebhook"));

    let mut group = TransitionRouteGroup::new(format!("{SRC_FLOW}/transitionRouteGroups/rg1"), "Ordering");
    group.transition_routes = vec![TransitionRoute::on_intent(src("intents/i1")).with_webhook(src("webhooks/w1"))];
    client.seed_route_group(SRC_FLOW, group);

    let (copier, _) = copier(client.clone());
    let selection = ResourceSelection::new()
        .with(ResourceCategory::Intents, [src("intents/i1")])
        .with(ResourceCategory::Webhooks, [src("webhooks/w1")])
        .with(
            ResourceCategory::RouteGroups,
            [format!("{SRC_FLOW}/transitionRouteGroups/rg1")],
        );
    let report = copier
        .copy_resources(&selection, SRC, DST, FLOW_NAME, &[])
        .await
        .unwrap();

    assert_eq!(
        report.outcome_of(ResourceCategory::Intents, "Order Pizza"),
        Some(&CopyOutcome::SkippedDuplicate)
    );
    assert_eq!(
        report.outcome_of(ResourceCategory::Webhooks, "OrderWebhook"),
        Some(&CopyOutcome::SkippedDuplicate)
    );
    assert_eq!(
        report.outcome_of(ResourceCategory::RouteGroups, "Ordering"),
        Some(&CopyOutcome::Created)
    );

    let groups = client.list_transition_route_groups(DST_FLOW).await.unwrap();
    let route = &groups[0].transition_routes[0];
    assert_eq!(route.intent, Some(format!("{DST}/intents/i9")));
    assert_eq!(route.webhook(), Some(format!("{DST}/webhooks/w9").as_str()));
}

/// Test that an unresolvable reference fails only its own resource
#[tokio::test]
async fn test_missing_intent_fails_route_group_and_continues() {
    let client = Arc::new(InMemoryAgentClient::new());
    client.seed_flow(SRC, Flow::new(SRC_FLOW, FLOW_NAME));
    client.seed_flow(DST, Flow::new(DST_FLOW, FLOW_NAME));

    let mut broken = TransitionRouteGroup::new(format!("{SRC_FLOW}/transitionRouteGroups/rg1"), "Broken");
    broken.transition_routes = vec![TransitionRoute::on_intent(src("intents/ghost"))];
    client.seed_route_group(SRC_FLOW, broken);

    let mut fine = TransitionRouteGroup::new(format!("{SRC_FLOW}/transitionRouteGroups/rg2"), "Fine");
    fine.transition_routes = vec![TransitionRoute::on_condition("true").with_target_page(src_page("END_FLOW"))];
    client.seed_route_group(SRC_FLOW, fine);

    let (copier, observer) = copier(client.clone());
    let selection = ResourceSelection::new().with(
        ResourceCategory::RouteGroups,
        [
            format!("{SRC_FLOW}/transitionRouteGroups/rg1"),
            format!("{SRC_FLOW}/transitionRouteGroups/rg2"),
        ],
    );
    let report = copier
        .copy_resources(&selection, SRC, DST, FLOW_NAME, &[])
        .await
        .unwrap();

    match report.outcome_of(ResourceCategory::RouteGroups, "Broken") {
        Some(CopyOutcome::Failed(reason)) => assert!(reason.contains(&src("intents/ghost"))),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        report.outcome_of(ResourceCategory::RouteGroups, "Fine"),
        Some(&CopyOutcome::Created)
    );

    let ghost = src("intents/ghost");
    assert_eq!(
        observer.count(|e| matches!(
            e,
            CopyEvent::LookupMiss { category: ResourceCategory::Intents, key } if *key == ghost
        )),
        1
    );
    let groups = client.list_transition_route_groups(DST_FLOW).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].display_name, "Fine");
}
