//! HTTP implementation of the WorkflowEngine
//!
//! This module provides integration with a workflow engine exposing its
//! control API as JSON over HTTP.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{ExecutionRecord, WorkflowEngine};
use crate::error::{ServerError, ServerResult};

/// HTTP client for the workflow engine control API
#[derive(Debug, Clone)]
pub struct HttpWorkflowEngine {
    /// Base URL for the engine API
    api_base_url: String,

    /// Bearer token, if the engine requires one
    api_token: Option<String>,

    /// HTTP client
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartExecutionResponse {
    execution_arn: String,
}

#[derive(Debug, Deserialize)]
struct ListExecutionsResponse {
    executions: Vec<ExecutionRecord>,
}

impl HttpWorkflowEngine {
    /// Create a new HttpWorkflowEngine
    pub fn new(api_base_url: String, api_token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base_url,
            api_token,
            client,
        }
    }

    /// Get the URL for the executions collection
    fn executions_url(&self) -> String {
        format!("{}/v1/executions", self.api_base_url)
    }

    /// Get the URL for the engine health probe
    fn health_url(&self) -> String {
        format!("{}/v1/health", self.api_base_url)
    }

    /// Attach the bearer token when one is configured
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl WorkflowEngine for HttpWorkflowEngine {
    async fn start_execution(&self, workflow_id: &str, input: Value) -> ServerResult<String> {
        debug!("Starting execution of workflow {}", workflow_id);

        let response = self
            .authorize(self.client.post(self.executions_url()))
            .json(&json!({
                "workflowId": workflow_id,
                "input": input,
            }))
            .send()
            .await
            .map_err(|e| ServerError::EngineError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ServerError::EngineError(format!(
                "Failed to start execution: {}",
                error_body
            )));
        }

        let started: StartExecutionResponse = response
            .json()
            .await
            .map_err(|e| ServerError::EngineError(e.to_string()))?;

        Ok(started.execution_arn)
    }

    async fn list_executions(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> ServerResult<Vec<ExecutionRecord>> {
        debug!("Listing up to {} executions of workflow {}", limit, workflow_id);

        let response = self
            .authorize(self.client.get(self.executions_url()))
            .query(&[
                ("workflowId", workflow_id.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ServerError::EngineError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ServerError::EngineError(format!(
                "Failed to list executions: {}",
                error_body
            )));
        }

        let listed: ListExecutionsResponse = response
            .json()
            .await
            .map_err(|e| ServerError::EngineError(e.to_string()))?;

        Ok(listed.executions)
    }

    async fn health_check(&self) -> ServerResult<bool> {
        let response = self
            .authorize(self.client.get(self.health_url()))
            .send()
            .await
            .map_err(|e| ServerError::EngineError(e.to_string()))?;

        Ok(response.status().is_success())
    }
}
