//! Log aggregation store integration
//!
//! This module contains the log store client and related functionality. The
//! store runs aggregation queries asynchronously: submitting a query returns
//! a job identifier immediately, and results become available once the job
//! reaches the `Complete` state.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::ServerResult;

/// Time window an aggregation query runs over, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Window start, inclusive
    pub start_time: i64,
    /// Window end, inclusive
    pub end_time: i64,
}

impl QueryWindow {
    /// Window covering the last `hours` hours, ending now.
    pub fn last_hours(hours: u64) -> Self {
        let end = Utc::now();
        let start = end - ChronoDuration::hours(hours as i64);
        Self {
            start_time: start.timestamp(),
            end_time: end.timestamp(),
        }
    }
}

/// State of a server-side aggregation query job.
///
/// Jobs move `Scheduled -> Running ->` one of the terminal states; no other
/// transitions occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryJobStatus {
    /// Accepted, not yet running
    Scheduled,
    /// Running server-side
    Running,
    /// Finished, results available
    Complete,
    /// Failed server-side
    Failed,
    /// Cancelled by an operator
    Cancelled,
    /// Timed out server-side
    Timeout,
    /// A status this client does not know about
    Unknown,
}

impl<'de> Deserialize<'de> for QueryJobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Tolerate statuses introduced by newer store versions
        let status = String::deserialize(deserializer)?;
        Ok(match status.as_str() {
            "Scheduled" => QueryJobStatus::Scheduled,
            "Running" => QueryJobStatus::Running,
            "Complete" => QueryJobStatus::Complete,
            "Failed" => QueryJobStatus::Failed,
            "Cancelled" => QueryJobStatus::Cancelled,
            "Timeout" => QueryJobStatus::Timeout,
            _ => QueryJobStatus::Unknown,
        })
    }
}

impl QueryJobStatus {
    /// Whether the job is still in flight and worth polling again
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryJobStatus::Scheduled | QueryJobStatus::Running)
    }
}

/// One column of one result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultField {
    /// Column name from the query's projection
    pub field: String,
    /// Column value, always transported as a string
    pub value: String,
}

/// Snapshot of a query job: its state and, once `Complete`, its result rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryJob {
    /// Current job state
    pub status: QueryJobStatus,

    /// Result rows; empty until the job completes
    #[serde(default)]
    pub results: Vec<Vec<ResultField>>,
}

/// Interface for log store operations
#[async_trait]
pub trait LogStore: Send + Sync + Debug {
    /// Submit an aggregation query over `log_group` for the given window.
    /// Returns the job identifier; the query runs asynchronously server-side.
    async fn submit_query(
        &self,
        log_group: &str,
        window: QueryWindow,
        query: &str,
        limit: usize,
    ) -> ServerResult<String>;

    /// Fetch the current state (and any available results) of a query job.
    async fn query_results(&self, query_id: &str) -> ServerResult<QueryJob>;

    /// Get health status
    async fn health_check(&self) -> ServerResult<bool>;
}

/// Re-export specific implementations
pub mod http;

pub use http::HttpLogStore;
