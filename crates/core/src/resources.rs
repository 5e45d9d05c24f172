//! Agent resource model
//!
//! Mirrors the JSON shape of the agent-management REST API (camelCase keys).
//! Optional sub-structures are explicit `Option`s so traversal code can test
//! presence field by field. Every structure keeps the fields it does not
//! model in a flattened `extra` map, so a fetched resource survives a copy to
//! another agent without losing configuration.
//!
//! All types are plain values: rewriting always works on a clone, never on
//! the fetched original.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity shared by every addressable resource
pub trait Resource {
    /// Full identifier path (empty before creation)
    fn name(&self) -> &str;

    /// Human-readable name, unique per category within an agent
    fn display_name(&self) -> &str;

    /// Replace the identifier path
    fn set_name(&mut self, name: String);
}

macro_rules! impl_resource {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Resource for $ty {
                fn name(&self) -> &str {
                    &self.name
                }

                fn display_name(&self) -> &str {
                    &self.display_name
                }

                fn set_name(&mut self, name: String) {
                    self.name = name;
                }
            }
        )+
    };
}

impl_resource!(Flow, Page, TransitionRouteGroup, Intent, EntityType, Webhook);

// ============================================================================
// Fulfillment
// ============================================================================

/// Plain text response variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One response message of a fulfillment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
    /// Payloads, conditional cases and other message kinds
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResponseMessage {
    /// Text message with a single variant
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(TextMessage {
                text: vec![text.into()],
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    /// First text variant, if this is a text message
    pub fn first_text(&self) -> Option<&str> {
        self.text
            .as_ref()
            .and_then(|t| t.text.first())
            .map(String::as_str)
    }
}

/// What the agent does when a page is entered or a route/handler fires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ResponseMessage>,
    /// Webhook reference (identifier, or display name in portable form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    /// Tag sent to the webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Fulfillment {
    /// Fulfillment calling a webhook
    pub fn webhook(webhook: impl Into<String>) -> Self {
        Self {
            webhook: Some(webhook.into()),
            ..Default::default()
        }
    }

    /// Fulfillment sending a single text message
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ResponseMessage::text(text)],
            ..Default::default()
        }
    }
}

// ============================================================================
// Routes and handlers
// ============================================================================

/// Intent- or condition-triggered transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_fulfillment: Option<Fulfillment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_flow: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransitionRoute {
    /// Route triggered by an intent
    pub fn on_intent(intent: impl Into<String>) -> Self {
        Self {
            intent: Some(intent.into()),
            ..Default::default()
        }
    }

    /// Route triggered by a condition
    pub fn on_condition(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            ..Default::default()
        }
    }

    pub fn with_target_page(mut self, page: impl Into<String>) -> Self {
        self.target_page = Some(page.into());
        self
    }

    pub fn with_webhook(mut self, webhook: impl Into<String>) -> Self {
        self.trigger_fulfillment
            .get_or_insert_with(Fulfillment::default)
            .webhook = Some(webhook.into());
        self
    }

    /// Webhook of the trigger fulfillment, if any
    pub fn webhook(&self) -> Option<&str> {
        self.trigger_fulfillment
            .as_ref()
            .and_then(|f| f.webhook.as_deref())
    }
}

/// Event-triggered handler (no-match, no-input, webhook errors, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHandler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_fulfillment: Option<Fulfillment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_flow: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventHandler {
    pub fn on_event(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    pub fn with_target_page(mut self, page: impl Into<String>) -> Self {
        self.target_page = Some(page.into());
        self
    }

    pub fn with_webhook(mut self, webhook: impl Into<String>) -> Self {
        self.trigger_fulfillment
            .get_or_insert_with(Fulfillment::default)
            .webhook = Some(webhook.into());
        self
    }

    pub fn webhook(&self) -> Option<&str> {
        self.trigger_fulfillment
            .as_ref()
            .and_then(|f| f.webhook.as_deref())
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Prompting behaviour of a form parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillBehavior {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_prompt_fulfillment: Option<Fulfillment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reprompt_event_handlers: Vec<EventHandler>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameter collected by a page form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormParameter {
    pub display_name: String,
    #[serde(default)]
    pub required: bool,
    /// Entity type reference; `sys.` types are agent-independent
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_behavior: Option<FillBehavior>,
    #[serde(default)]
    pub redact: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormParameter {
    pub fn new(display_name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            entity_type: entity_type.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<FormParameter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Flow-scoped resources
// ============================================================================

/// Conversation flow; its own routes and handlers form the start page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transition_routes: Vec<TransitionRoute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_handlers: Vec<EventHandler>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transition_route_groups: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flow {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

/// Conversation state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_fulfillment: Option<Fulfillment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transition_route_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transition_routes: Vec<TransitionRoute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_handlers: Vec<EventHandler>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Empty page carrying only a display name (a "shell")
    pub fn shell(display_name: impl Into<String>) -> Self {
        Self::new(String::new(), display_name)
    }

    /// Form parameters, empty when the page has no form
    pub fn form_parameters(&self) -> &[FormParameter] {
        self.form
            .as_ref()
            .map(|f| f.parameters.as_slice())
            .unwrap_or(&[])
    }
}

/// Reusable bundle of transition routes scoped to a flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRouteGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transition_routes: Vec<TransitionRoute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransitionRouteGroup {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Agent-scoped resources
// ============================================================================

/// Annotated part of a training phrase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPhrasePart {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPhrase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub parts: Vec<TrainingPhrasePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrainingPhrase {
    /// Full phrase text with parts joined in order
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Parameter annotated in an intent's training phrases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentParameter {
    pub id: String,
    pub entity_type: String,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub redact: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub training_phrases: Vec<TrainingPhrase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<IntentParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Intent {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

/// Entity value with its synonyms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEntry {
    pub value: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityType {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntityEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityType {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

/// Webhook; service URI, credentials and timeouts ride along in `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Webhook {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            extra: Map::new(),
        }
    }
}
