//! HTTP implementation of the LogStore
//!
//! This module provides integration with a log aggregation store exposing
//! its query API as JSON over HTTP.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{LogStore, QueryJob, QueryWindow};
use crate::error::{ServerError, ServerResult};

/// HTTP client for the log store query API
#[derive(Debug, Clone)]
pub struct HttpLogStore {
    /// Base URL for the log store API
    api_base_url: String,

    /// Bearer token, if the store requires one
    api_token: Option<String>,

    /// HTTP client
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitQueryResponse {
    query_id: String,
}

impl HttpLogStore {
    /// Create a new HttpLogStore
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

    /// Get the URL for the queries collection
    fn queries_url(&self) -> String {
        format!("{}/v1/queries", self.api_base_url)
    }

    /// Get the URL for a specific query job
    fn query_url(&self, query_id: &str) -> String {
        format!("{}/{}", self.queries_url(), query_id)
    }

    /// Get the URL for the store health probe
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
impl LogStore for HttpLogStore {
    async fn submit_query(
        &self,
        log_group: &str,
        window: QueryWindow,
        query: &str,
        limit: usize,
    ) -> ServerResult<String> {
        debug!("Submitting aggregation query against {}", log_group);

        let response = self
            .authorize(self.client.post(self.queries_url()))
            .json(&json!({
                "logGroupName": log_group,
                "startTime": window.start_time,
                "endTime": window.end_time,
                "queryString": query,
                "limit": limit,
            }))
            .send()
            .await
            .map_err(|e| ServerError::LogStoreError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ServerError::LogStoreError(format!(
                "Failed to submit query: {}",
                error_body
            )));
        }

        let submitted: SubmitQueryResponse = response
            .json()
            .await
            .map_err(|e| ServerError::LogStoreError(e.to_string()))?;

        Ok(submitted.query_id)
    }

    async fn query_results(&self, query_id: &str) -> ServerResult<QueryJob> {
        let response = self
            .authorize(self.client.get(self.query_url(query_id)))
            .send()
            .await
            .map_err(|e| ServerError::LogStoreError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ServerError::LogStoreError(format!(
                "Failed to fetch query {}: {}",
                query_id, error_body
            )));
        }

        let job: QueryJob = response
            .json()
            .await
            .map_err(|e| ServerError::LogStoreError(e.to_string()))?;

        Ok(job)
    }

    async fn health_check(&self) -> ServerResult<bool> {
        let response = self
            .authorize(self.client.get(self.health_url()))
            .send()
            .await
            .map_err(|e| ServerError::LogStoreError(e.to_string()))?;

        Ok(response.status().is_success())
    }
}
