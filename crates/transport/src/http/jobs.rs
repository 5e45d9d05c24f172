//! Flow export/import job submission
//!
//! Both calls start a long-running operation on the service and return its
//! handle immediately. Polling the operation is left to the caller.

use std::sync::Arc;

use cx_porter_config::{ApiConfig, DataFormat, ExportConfig, ImportOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::HttpApi;
use crate::auth::TokenProvider;
use crate::error::{Result, TransportError};

/// Handle of a submitted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    flow_uri: &'a str,
    data_format: DataFormat,
    include_referenced_flows: bool,
}

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    flow_uri: &'a str,
    import_option: ImportOption,
}

/// Submits flow export and import jobs
#[derive(Clone)]
pub struct ExportImportClient {
    api: HttpApi,
}

impl ExportImportClient {
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        Ok(Self {
            api: HttpApi::new(config, tokens)?,
        })
    }

    /// Export `flow` to a storage URI
    pub async fn export_flow(
        &self,
        flow: &str,
        flow_uri: &str,
        data_format: DataFormat,
        include_referenced_flows: bool,
    ) -> Result<LongRunningOperation> {
        let url = self.api.endpoint().url(flow, ":export");
        let body = ExportRequest {
            flow_uri,
            data_format,
            include_referenced_flows,
        };
        let operation = self.submit(&url, &body).await?;
        tracing::info!(flow = %flow, uri = %flow_uri, operation = %operation.name, "Flow export submitted");
        Ok(operation)
    }

    /// Import a flow from a storage URI into `agent`
    pub async fn import_flow(
        &self,
        agent: &str,
        flow_uri: &str,
        import_option: ImportOption,
    ) -> Result<LongRunningOperation> {
        let url = self.api.endpoint().url(agent, "/flows:import");
        let body = ImportRequest {
            flow_uri,
            import_option,
        };
        let operation = self.submit(&url, &body).await?;
        tracing::info!(agent = %agent, uri = %flow_uri, operation = %operation.name, "Flow import submitted");
        Ok(operation)
    }

    /// `export_flow` with format options taken from configuration
    pub async fn export_flow_with(
        &self,
        flow: &str,
        flow_uri: &str,
        config: &ExportConfig,
    ) -> Result<LongRunningOperation> {
        self.export_flow(
            flow,
            flow_uri,
            config.data_format()?,
            config.include_referenced_flows,
        )
        .await
    }

    /// `import_flow` with the import option taken from configuration
    pub async fn import_flow_with(
        &self,
        agent: &str,
        flow_uri: &str,
        config: &ExportConfig,
    ) -> Result<LongRunningOperation> {
        self.import_flow(agent, flow_uri, config.import_option()?)
            .await
    }

    async fn submit<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<LongRunningOperation> {
        let response = self
            .api
            .client()
            .post(url)
            .headers(self.api.headers().await?)
            .json(body)
            .send()
            .await?;

        self.api.check(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AGENT: &str = "projects/p/locations/global/agents/a";

    fn jobs(server: &MockServer) -> ExportImportClient {
        let config = ApiConfig {
            endpoint: server.uri(),
            ..Default::default()
        };
        ExportImportClient::new(&config, Arc::new(StaticTokenProvider::new("t0k"))).unwrap()
    }

    #[tokio::test]
    async fn test_export_flow_posts_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v3beta1/{AGENT}/flows/f1:export").as_str()))
            .and(header("authorization", "Bearer t0k"))
            .and(body_json(json!({
                "flow_uri": "gs://bucket/flow.blob",
                "data_format": "BLOB",
                "include_referenced_flows": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": format!("{AGENT}/operations/op-1"),
                "metadata": {"@type": "type.googleapis.com/google.protobuf.Struct"}
            })))
            .mount(&server)
            .await;

        let op = jobs(&server)
            .export_flow_with(&format!("{AGENT}/flows/f1"), "gs://bucket/flow.blob", &ExportConfig::default())
            .await
            .unwrap();
        assert_eq!(op.name, format!("{AGENT}/operations/op-1"));
        assert!(!op.done);
        assert!(op.metadata.is_some());
    }

    #[tokio::test]
    async fn test_import_flow_posts_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v3beta1/{AGENT}/flows:import").as_str()))
            .and(body_json(json!({
                "flow_uri": "gs://bucket/flow.blob",
                "import_option": "KEEP"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": format!("{AGENT}/operations/op-2"),
                "done": true
            })))
            .mount(&server)
            .await;

        let op = jobs(&server)
            .import_flow(AGENT, "gs://bucket/flow.blob", ImportOption::Keep)
            .await
            .unwrap();
        assert!(op.done);
    }

    #[tokio::test]
    async fn test_non_success_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = jobs(&server)
            .import_flow(AGENT, "gs://bucket/flow.blob", ImportOption::Fallback)
            .await
            .unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_export_config() {
        let server = MockServer::start().await;
        let config = ExportConfig {
            data_format: "XML".to_string(),
            ..Default::default()
        };
        let err = jobs(&server)
            .export_flow_with(&format!("{AGENT}/flows/f1"), "gs://b/f", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }
}
