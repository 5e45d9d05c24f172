//! Identifier paths, resource categories and sentinel targets
//!
//! Every resource is addressed by a path-like identifier:
//!
//! ```text
//! projects/<project>/locations/<location>/agents/<agent>
//!     [/flows/<flow>[/pages/<page>|/transitionRouteGroups/<rg>]]
//! ```
//!
//! Identifiers are opaque and agent-scoped. The helpers here only slice them
//! on `/`; they never rebuild a path from parts other than by appending.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CategoryParseError;

/// Marker contained in every built-in (agent-independent) entity type reference
pub const SYSTEM_ENTITY_MARKER: &str = "sys.";

/// Number of path segments in a flow identifier
const FLOW_PATH_SEGMENTS: usize = 8;

/// Number of path segments in an agent identifier
const AGENT_PATH_SEGMENTS: usize = 6;

/// Last `/`-separated segment of an identifier (the bare id)
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Built-in entity types are shared by all agents and never remapped
pub fn is_system_entity(entity_type: &str) -> bool {
    entity_type.contains(SYSTEM_ENTITY_MARKER)
}

/// Flow identifier owning a page or route group identifier
///
/// Returns `None` when the path does not reach down to a flow.
pub fn flow_path(resource: &str) -> Option<String> {
    let segments: Vec<&str> = resource.split('/').collect();
    if segments.len() < FLOW_PATH_SEGMENTS || segments[6] != "flows" {
        return None;
    }
    Some(segments[..FLOW_PATH_SEGMENTS].join("/"))
}

/// Agent identifier owning any resource identifier
pub fn agent_path(resource: &str) -> Option<String> {
    let segments: Vec<&str> = resource.split('/').collect();
    if segments.len() < AGENT_PATH_SEGMENTS
        || segments[0] != "projects"
        || segments[2] != "locations"
        || segments[4] != "agents"
    {
        return None;
    }
    Some(segments[..AGENT_PATH_SEGMENTS].join("/"))
}

/// Location segment of an identifier (`global`, `us-central1`, ...)
pub fn location(resource: &str) -> Option<&str> {
    let mut segments = resource.split('/');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some("projects"), Some(_), Some("locations"), Some(loc)) if !loc.is_empty() => Some(loc),
        _ => None,
    }
}

/// Structural transition targets that are not resources
///
/// In agent-specific form a sentinel is a page path ending in the token
/// (`<flow>/pages/END_FLOW`); in portable form it is the bare token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentinel {
    EndFlow,
    EndSession,
    CurrentPage,
    StartPage,
}

impl Sentinel {
    /// Bare token as it appears in the last path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndFlow => "END_FLOW",
            Self::EndSession => "END_SESSION",
            Self::CurrentPage => "CURRENT_PAGE",
            Self::StartPage => "START_PAGE",
        }
    }

    /// Parse a bare token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "END_FLOW" => Some(Self::EndFlow),
            "END_SESSION" => Some(Self::EndSession),
            "CURRENT_PAGE" => Some(Self::CurrentPage),
            "START_PAGE" => Some(Self::StartPage),
            _ => None,
        }
    }

    /// Fully qualified page path of this sentinel inside `flow`
    pub fn qualified(&self, flow: &str) -> String {
        format!("{}/pages/{}", flow, self.as_str())
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource categories that can be indexed, selected and copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceCategory {
    #[serde(rename = "flows")]
    Flows,
    #[serde(rename = "intents")]
    Intents,
    #[serde(rename = "entities")]
    EntityTypes,
    #[serde(rename = "webhooks")]
    Webhooks,
    #[serde(rename = "pages")]
    Pages,
    #[serde(rename = "route_groups")]
    RouteGroups,
}

impl ResourceCategory {
    /// Selection key used in dependency maps and skip lists
    pub fn key(&self) -> &'static str {
        match self {
            Self::Flows => "flows",
            Self::Intents => "intents",
            Self::EntityTypes => "entities",
            Self::Webhooks => "webhooks",
            Self::Pages => "pages",
            Self::RouteGroups => "route_groups",
        }
    }

    /// Collection segment under the parent identifier
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Flows => "flows",
            Self::Intents => "intents",
            Self::EntityTypes => "entityTypes",
            Self::Webhooks => "webhooks",
            Self::Pages => "pages",
            Self::RouteGroups => "transitionRouteGroups",
        }
    }

    /// Pages and route groups live under a flow, everything else under the agent
    pub fn is_flow_scoped(&self) -> bool {
        matches!(self, Self::Pages | Self::RouteGroups)
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ResourceCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flows" => Ok(Self::Flows),
            "intents" => Ok(Self::Intents),
            "entities" | "entity_types" => Ok(Self::EntityTypes),
            "webhooks" => Ok(Self::Webhooks),
            "pages" => Ok(Self::Pages),
            "route_groups" => Ok(Self::RouteGroups),
            other => Err(CategoryParseError(other.to_string())),
        }
    }
}
