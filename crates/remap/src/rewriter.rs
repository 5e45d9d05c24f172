//! Reference Rewriter
//!
//! Translates every cross-resource reference inside a page, a start page,
//! a route group or an intent between two forms:
//!
//! ```text
//! Source:       agent identifiers  → display names, sentinel paths → bare tokens
//! Destination:  display names      → agent identifiers, bare tokens → <flow>/pages/TOKEN
//! ```
//!
//! Copying a resource from agent A to agent B is a Source pass with A's
//! indexes followed by a Destination pass with B's. Built-in (`sys.`) entity
//! types never go through an index. Inputs are never mutated; every call
//! returns a fresh owned value.

use std::sync::Arc;

use cx_porter_core::{
    is_system_entity, last_segment, AgentClient, CopyEvent, CopyObserver, EventHandler, Flow,
    Fulfillment, Intent, Page, ResourceCategory, Sentinel, TransitionRoute, TransitionRouteGroup,
};

use crate::error::{RemapError, Result};
use crate::index::{build_index, IdentityIndex};

/// Which way references are translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Agent identifiers to portable display names
    Source,
    /// Portable display names to agent identifiers
    Destination,
}

impl Direction {
    /// Index orientation needed for this direction
    pub fn reverse_index(&self) -> bool {
        matches!(self, Self::Destination)
    }
}

/// Sentinel targets recognised on a given root object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelSet(&'static [Sentinel]);

impl SentinelSet {
    /// Targets allowed on regular pages and route groups
    pub const PAGE: SentinelSet = SentinelSet(&[
        Sentinel::EndFlow,
        Sentinel::EndSession,
        Sentinel::CurrentPage,
    ]);

    /// Targets allowed on a flow's start page
    pub const START_PAGE: SentinelSet = SentinelSet(&[Sentinel::EndFlow, Sentinel::StartPage]);

    /// Sentinel for `token` if it belongs to this set
    pub fn match_token(&self, token: &str) -> Option<Sentinel> {
        Sentinel::from_token(token).filter(|s| self.0.contains(s))
    }

    pub fn sentinels(&self) -> &'static [Sentinel] {
        self.0
    }
}

/// Indexes of one agent, oriented for one direction
#[derive(Debug, Clone)]
pub struct RewriteContext {
    direction: Direction,
    flow: String,
    intents: IdentityIndex,
    entity_types: IdentityIndex,
    webhooks: IdentityIndex,
    pages: IdentityIndex,
    route_groups: IdentityIndex,
    flows: IdentityIndex,
}

impl RewriteContext {
    /// Context with empty indexes; fill them with `with_index`
    pub fn new(direction: Direction, flow: impl Into<String>) -> Self {
        let reverse = direction.reverse_index();
        Self {
            direction,
            flow: flow.into(),
            intents: IdentityIndex::new(ResourceCategory::Intents, reverse),
            entity_types: IdentityIndex::new(ResourceCategory::EntityTypes, reverse),
            webhooks: IdentityIndex::new(ResourceCategory::Webhooks, reverse),
            pages: IdentityIndex::new(ResourceCategory::Pages, reverse),
            route_groups: IdentityIndex::new(ResourceCategory::RouteGroups, reverse),
            flows: IdentityIndex::new(ResourceCategory::Flows, reverse),
        }
    }

    /// Replace the index of the index's own category
    pub fn with_index(mut self, index: IdentityIndex) -> Self {
        let slot = match index.category() {
            ResourceCategory::Intents => &mut self.intents,
            ResourceCategory::EntityTypes => &mut self.entity_types,
            ResourceCategory::Webhooks => &mut self.webhooks,
            ResourceCategory::Pages => &mut self.pages,
            ResourceCategory::RouteGroups => &mut self.route_groups,
            ResourceCategory::Flows => &mut self.flows,
        };
        *slot = index;
        self
    }

    /// Build every index for `agent` from the collaborator
    ///
    /// `flow_display_name` selects the flow whose pages and route groups are
    /// indexed and whose identifier qualifies sentinel targets. Display-name
    /// collisions are reported to `observer`.
    pub async fn load(
        client: &dyn AgentClient,
        agent: &str,
        flow_display_name: &str,
        direction: Direction,
        observer: &dyn CopyObserver,
    ) -> Result<Self> {
        let reverse = direction.reverse_index();

        let flows_by_name = build_index(client, agent, ResourceCategory::Flows, true).await?;
        let flow = flows_by_name
            .get(flow_display_name)
            .ok_or_else(|| RemapError::FlowNotFound(flow_display_name.to_string()))?
            .to_string();
        let flows = if reverse {
            flows_by_name
        } else {
            flows_by_name.inverted()
        };

        let context = Self::new(direction, flow.clone())
            .with_index(flows)
            .with_index(build_index(client, agent, ResourceCategory::Intents, reverse).await?)
            .with_index(build_index(client, agent, ResourceCategory::EntityTypes, reverse).await?)
            .with_index(build_index(client, agent, ResourceCategory::Webhooks, reverse).await?)
            .with_index(build_index(client, &flow, ResourceCategory::Pages, reverse).await?)
            .with_index(build_index(client, &flow, ResourceCategory::RouteGroups, reverse).await?);

        for index in context.indexes() {
            index.report_collisions(observer);
        }

        tracing::debug!(
            agent = %agent,
            flow = %flow,
            direction = ?direction,
            "Loaded rewrite context"
        );

        Ok(context)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Identifier of the flow sentinels are qualified with
    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub fn index(&self, category: ResourceCategory) -> &IdentityIndex {
        match category {
            ResourceCategory::Intents => &self.intents,
            ResourceCategory::EntityTypes => &self.entity_types,
            ResourceCategory::Webhooks => &self.webhooks,
            ResourceCategory::Pages => &self.pages,
            ResourceCategory::RouteGroups => &self.route_groups,
            ResourceCategory::Flows => &self.flows,
        }
    }

    fn indexes(&self) -> [&IdentityIndex; 6] {
        [
            &self.flows,
            &self.intents,
            &self.entity_types,
            &self.webhooks,
            &self.pages,
            &self.route_groups,
        ]
    }
}

/// Applies one `RewriteContext` to resources
pub struct Rewriter {
    context: RewriteContext,
    observer: Arc<dyn CopyObserver>,
}

impl Rewriter {
    pub fn new(context: RewriteContext, observer: Arc<dyn CopyObserver>) -> Self {
        Self { context, observer }
    }

    pub fn context(&self) -> &RewriteContext {
        &self.context
    }

    pub fn direction(&self) -> Direction {
        self.context.direction
    }

    fn translate(&self, category: ResourceCategory, key: &str) -> Result<String> {
        match self.context.index(category).lookup(key) {
            Ok(value) => Ok(value.to_string()),
            Err(err) => {
                self.observer.notify(&CopyEvent::LookupMiss {
                    category,
                    key: key.to_string(),
                });
                Err(err)
            }
        }
    }

    fn rewrite_target_page(&self, target: &str, sentinels: SentinelSet) -> Result<String> {
        match self.context.direction {
            Direction::Source => match sentinels.match_token(last_segment(target)) {
                Some(sentinel) => Ok(sentinel.as_str().to_string()),
                None => self.translate(ResourceCategory::Pages, target),
            },
            Direction::Destination => match sentinels.match_token(target) {
                Some(sentinel) => Ok(sentinel.qualified(&self.context.flow)),
                None => self.translate(ResourceCategory::Pages, target),
            },
        }
    }

    fn rewrite_fulfillment(&self, fulfillment: &mut Option<Fulfillment>) -> Result<()> {
        if let Some(webhook) = fulfillment.as_mut().and_then(|f| f.webhook.as_mut()) {
            *webhook = self.translate(ResourceCategory::Webhooks, webhook)?;
        }
        Ok(())
    }

    fn rewrite_entity_type(&self, entity_type: &mut String) -> Result<()> {
        if !entity_type.is_empty() && !is_system_entity(entity_type) {
            *entity_type = self.translate(ResourceCategory::EntityTypes, entity_type)?;
        }
        Ok(())
    }

    /// Rewrite the target, intent and webhook of one route
    pub fn rewrite_route(
        &self,
        route: &TransitionRoute,
        sentinels: SentinelSet,
    ) -> Result<TransitionRoute> {
        let mut route = route.clone();
        if let Some(target) = route.target_page.as_mut() {
            *target = self.rewrite_target_page(target, sentinels)?;
        }
        if let Some(flow) = route.target_flow.as_mut() {
            *flow = self.translate(ResourceCategory::Flows, flow)?;
        }
        if let Some(intent) = route.intent.as_mut() {
            *intent = self.translate(ResourceCategory::Intents, intent)?;
        }
        self.rewrite_fulfillment(&mut route.trigger_fulfillment)?;
        Ok(route)
    }

    /// Rewrite the target and webhook of one event handler
    pub fn rewrite_event_handler(
        &self,
        handler: &EventHandler,
        sentinels: SentinelSet,
    ) -> Result<EventHandler> {
        let mut handler = handler.clone();
        if let Some(target) = handler.target_page.as_mut() {
            *target = self.rewrite_target_page(target, sentinels)?;
        }
        if let Some(flow) = handler.target_flow.as_mut() {
            *flow = self.translate(ResourceCategory::Flows, flow)?;
        }
        self.rewrite_fulfillment(&mut handler.trigger_fulfillment)?;
        Ok(handler)
    }

    fn rewrite_routes(
        &self,
        routes: &[TransitionRoute],
        sentinels: SentinelSet,
    ) -> Result<Vec<TransitionRoute>> {
        routes
            .iter()
            .map(|r| self.rewrite_route(r, sentinels))
            .collect()
    }

    fn rewrite_handlers(
        &self,
        handlers: &[EventHandler],
        sentinels: SentinelSet,
    ) -> Result<Vec<EventHandler>> {
        handlers
            .iter()
            .map(|h| self.rewrite_event_handler(h, sentinels))
            .collect()
    }

    /// Rewrite every reference of a page
    ///
    /// In the destination direction the page's own identifier is resolved
    /// from its display name as well.
    pub fn rewrite_page(&self, page: &Page) -> Result<Page> {
        let sentinels = SentinelSet::PAGE;
        let mut page = page.clone();

        if self.context.direction == Direction::Destination {
            page.name = self.translate(ResourceCategory::Pages, &page.display_name)?;
        }

        self.rewrite_fulfillment(&mut page.entry_fulfillment)?;
        page.transition_routes = self.rewrite_routes(&page.transition_routes, sentinels)?;
        page.event_handlers = self.rewrite_handlers(&page.event_handlers, sentinels)?;

        if let Some(form) = page.form.as_mut() {
            for param in &mut form.parameters {
                if let Some(fill) = param.fill_behavior.as_mut() {
                    self.rewrite_fulfillment(&mut fill.initial_prompt_fulfillment)?;
                    fill.reprompt_event_handlers =
                        self.rewrite_handlers(&fill.reprompt_event_handlers, sentinels)?;
                }
                self.rewrite_entity_type(&mut param.entity_type)?;
            }
        }

        page.transition_route_groups = page
            .transition_route_groups
            .iter()
            .map(|rg| self.translate(ResourceCategory::RouteGroups, rg))
            .collect::<Result<Vec<_>>>()?;

        Ok(page)
    }

    pub fn rewrite_pages(&self, pages: &[Page]) -> Result<Vec<Page>> {
        pages.iter().map(|p| self.rewrite_page(p)).collect()
    }

    /// Rewrite the start page of a flow (the flow's own transition routes)
    pub fn rewrite_start_page(&self, start_page: &Flow) -> Result<Flow> {
        let mut flow = start_page.clone();
        flow.transition_routes =
            self.rewrite_routes(&start_page.transition_routes, SentinelSet::START_PAGE)?;
        Ok(flow)
    }

    /// Rewrite every route of a route group
    pub fn rewrite_route_group(&self, group: &TransitionRouteGroup) -> Result<TransitionRouteGroup> {
        let mut group = group.clone();
        group.transition_routes = self.rewrite_routes(&group.transition_routes, SentinelSet::PAGE)?;
        Ok(group)
    }

    /// Rewrite the entity types of an intent's parameters
    pub fn rewrite_intent(&self, intent: &Intent) -> Result<Intent> {
        let mut intent = intent.clone();
        for param in &mut intent.parameters {
            self.rewrite_entity_type(&mut param.entity_type)?;
        }
        Ok(intent)
    }
}

/// Load `agent`'s indexes and rewrite `pages` in one direction
pub async fn convert_page_dependencies(
    client: &dyn AgentClient,
    agent: &str,
    pages: &[Page],
    direction: Direction,
    flow: &str,
    observer: Arc<dyn CopyObserver>,
) -> Result<Vec<Page>> {
    let context = RewriteContext::load(client, agent, flow, direction, observer.as_ref()).await?;
    Rewriter::new(context, observer).rewrite_pages(pages)
}

/// Load `agent`'s indexes and rewrite a flow's start page in one direction
pub async fn convert_start_page_dependencies(
    client: &dyn AgentClient,
    agent: &str,
    start_page: &Flow,
    direction: Direction,
    flow: &str,
    observer: Arc<dyn CopyObserver>,
) -> Result<Flow> {
    let context = RewriteContext::load(client, agent, flow, direction, observer.as_ref()).await?;
    Rewriter::new(context, observer).rewrite_start_page(start_page)
}
