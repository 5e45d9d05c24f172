//! HTTP plumbing shared by the REST collaborator and the job client
//!
//! - URL building, including regional hosts derived from the resource path
//! - Authorization and content-type headers
//! - Mapping of non-success statuses onto error kinds

mod agents;
mod jobs;

pub use agents::RestAgentClient;
pub use jobs::{ExportImportClient, LongRunningOperation};

use std::sync::Arc;
use std::time::Duration;

use cx_porter_config::constants::api;
use cx_porter_config::ApiConfig;
use cx_porter_core::{location, ClientError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};

use crate::auth::TokenProvider;
use crate::error::{Result, TransportError};

/// Content type sent with every request body
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Base URL and version of the agent-management API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    endpoint: String,
    version: String,
}

impl ApiEndpoint {
    pub fn new(endpoint: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            version: version.into(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.endpoint.clone(), config.version.clone())
    }

    /// `{host}/{version}` for a resource
    ///
    /// Resources in a non-global location are served from
    /// `https://<location>-dialogflow.googleapis.com` when the configured
    /// endpoint is the default global one. Custom endpoints are used as-is.
    pub fn base_for(&self, resource: &str) -> String {
        let host = match location(resource) {
            Some(loc) if loc != api::GLOBAL_LOCATION && self.endpoint == api::ENDPOINT => {
                format!("https://{}{}", loc, api::REGIONAL_HOST_SUFFIX)
            }
            _ => self.endpoint.clone(),
        };
        format!("{}/{}", host, self.version)
    }

    /// `{base}/{resource}{suffix}`
    pub fn url(&self, resource: &str, suffix: &str) -> String {
        format!("{}/{}{}", self.base_for(resource), resource, suffix)
    }
}

/// Error kind for a non-success status
pub(crate) fn status_error(status: u16, body: String) -> ClientError {
    if status == 409 || body.to_ascii_lowercase().contains("already exists") {
        return ClientError::AlreadyExists(body);
    }
    match status {
        404 => ClientError::NotFound(body),
        401 | 403 => ClientError::Unauthorized(body),
        _ => ClientError::Api {
            status,
            message: body,
        },
    }
}

/// Client, endpoint and token source bundled for authorized calls
#[derive(Clone)]
pub(crate) struct HttpApi {
    client: Client,
    endpoint: ApiEndpoint,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpApi {
    pub(crate) fn new(config: &ApiConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                TransportError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: ApiEndpoint::from_config(config),
            tokens,
        })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    /// Bearer authorization plus JSON content type
    pub(crate) async fn headers(&self) -> Result<HeaderMap> {
        let token = self.tokens.token().await?;
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| TransportError::Token(format!("Token is not a valid header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Ok(headers)
    }

    /// Fail fast on any non-success status
    ///
    /// A 401 also discards the cached token so the next request refreshes it.
    pub(crate) async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate();
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Request failed");
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
