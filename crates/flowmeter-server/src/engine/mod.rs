//! Workflow engine integration
//!
//! This module contains the workflow engine client and related functionality.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

use crate::error::ServerResult;

/// One execution record as reported by the engine's list API.
///
/// `stop_date` is absent while the execution is still running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// When the execution started
    pub start_date: DateTime<Utc>,

    /// When the execution finished, if it has
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_date: Option<DateTime<Utc>>,
}

/// Interface for workflow engine operations
#[async_trait]
pub trait WorkflowEngine: Send + Sync + Debug {
    /// Start a new execution of the given workflow, forwarding `input` as the
    /// execution input. Returns the engine-assigned execution handle.
    async fn start_execution(&self, workflow_id: &str, input: Value) -> ServerResult<String>;

    /// List the most recent executions of the given workflow, newest first.
    /// Ordering is delegated to the engine; no client-side resort is done.
    async fn list_executions(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> ServerResult<Vec<ExecutionRecord>>;

    /// Get health status
    async fn health_check(&self) -> ServerResult<bool>;
}

/// Re-export specific implementations
pub mod http;

pub use http::HttpWorkflowEngine;
