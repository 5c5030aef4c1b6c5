//! Duration retrieval for workflow executions
//!
//! Two structurally different channels recover "how long did the last
//! executions take": the express variant mines per-execution timestamps out
//! of its log group through an asynchronous aggregation query, while the
//! standard variant reads start/stop timestamps straight off the engine's
//! list API. The two are deliberately not unified beyond their output shape;
//! the log channel is minutes-stale, the list channel is near-real-time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::engine::WorkflowEngine;
use crate::error::{ServerError, ServerResult};
use crate::logs::{LogStore, QueryJobStatus, QueryWindow, ResultField};

/// Hard cap on samples per variant per retrieval, pushed into the
/// underlying queries rather than enforced after the fact.
pub const SAMPLE_LIMIT: usize = 10;

/// Aggregation query recovering per-execution durations: group raw events by
/// execution, span = max(event_timestamp) - min(event_timestamp), newest
/// completions first.
const DURATION_QUERY: &str = "\
fields @timestamp, execution_arn, id, event_timestamp
| stats min(event_timestamp) as start_time, max(event_timestamp) as end_time by execution_arn
| sort end_time desc
| limit 10
| display (end_time - start_time) as duration_milliseconds";

/// Which workflow execution mode a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowVariant {
    /// Low-latency, high-throughput mode with best-effort logging
    Express,
    /// Durable mode with synchronously queryable execution history
    Standard,
}

impl WorkflowVariant {
    /// Parse the wire name of a variant
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EXPRESS" => Some(WorkflowVariant::Express),
            "STANDARD" => Some(WorkflowVariant::Standard),
            _ => None,
        }
    }

    /// Wire name of this variant
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowVariant::Express => "EXPRESS",
            WorkflowVariant::Standard => "STANDARD",
        }
    }
}

/// Duration samples for both variants. The two sequences are independent
/// snapshots taken at slightly different instants; indices are not paired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Most recent express durations, milliseconds, newest first
    pub express: Vec<u64>,
    /// Most recent standard durations, milliseconds, newest first
    pub standard: Vec<u64>,
}

/// Drives an asynchronous aggregation query to completion.
///
/// Each call submits a fresh query over a fixed lookback window ending now,
/// then polls at a fixed interval until the job reaches a terminal state or
/// the deadline passes. Jobs are never cancelled; an abandoned job keeps
/// running server-side with no effect on this system.
#[derive(Debug, Clone)]
pub struct LogQueryDriver {
    store: Arc<dyn LogStore>,
    lookback_hours: u64,
    poll_interval: Duration,
    query_timeout: Duration,
}

impl LogQueryDriver {
    /// Create a new LogQueryDriver
    pub fn new(
        store: Arc<dyn LogStore>,
        lookback_hours: u64,
        poll_interval: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            store,
            lookback_hours,
            poll_interval,
            query_timeout,
        }
    }

    /// Return up to [`SAMPLE_LIMIT`] durations for the most recently
    /// completed executions recorded in `log_group`.
    ///
    /// A query that ends in a non-`Complete` terminal state yields an empty
    /// sequence, indistinguishable from a window with no executions; the
    /// failure is logged. Transport errors are not swallowed.
    pub async fn recent_durations(&self, log_group: &str) -> ServerResult<Vec<u64>> {
        let window = QueryWindow::last_hours(self.lookback_hours);
        let query_id = self
            .store
            .submit_query(log_group, window, DURATION_QUERY, SAMPLE_LIMIT)
            .await?;

        debug!("Submitted duration query {} against {}", query_id, log_group);

        let started = Instant::now();
        let deadline = started + self.query_timeout;

        loop {
            sleep(self.poll_interval).await;

            let job = self.store.query_results(&query_id).await?;
            match job.status {
                status if status.is_pending() => {
                    if Instant::now() >= deadline {
                        return Err(ServerError::QueryTimeout {
                            query_id,
                            waited_ms: started.elapsed().as_millis() as u64,
                        });
                    }
                }
                QueryJobStatus::Complete => {
                    return Ok(durations_from_rows(&job.results));
                }
                other => {
                    warn!(
                        "Duration query {} ended with status {:?}, returning no samples",
                        query_id, other
                    );
                    return Ok(Vec::new());
                }
            }
        }
    }
}

/// Extract the single numeric column from each result row as integer
/// milliseconds. Unparseable or negative values clamp to zero.
fn durations_from_rows(rows: &[Vec<ResultField>]) -> Vec<u64> {
    rows.iter()
        .map(|row| match row.first() {
            Some(column) => match column.value.parse::<f64>() {
                Ok(millis) if millis.is_finite() && millis >= 0.0 => millis as u64,
                Ok(millis) => {
                    warn!("Clamping out-of-range duration value {} to 0", millis);
                    0
                }
                Err(_) => {
                    warn!("Discarding unparseable duration value {:?}", column.value);
                    0
                }
            },
            None => {
                warn!("Duration query returned an empty result row");
                0
            }
        })
        .collect()
}

/// Picks the retrieval strategy per variant and normalizes both channels
/// into flat millisecond sequences.
#[derive(Debug, Clone)]
pub struct DurationResolver {
    engine: Arc<dyn WorkflowEngine>,
    log_driver: LogQueryDriver,
    express_log_group: String,
    standard_workflow_arn: String,
}

impl DurationResolver {
    /// Create a new DurationResolver
    pub fn new(
        engine: Arc<dyn WorkflowEngine>,
        log_driver: LogQueryDriver,
        express_log_group: String,
        standard_workflow_arn: String,
    ) -> Self {
        Self {
            engine,
            log_driver,
            express_log_group,
            standard_workflow_arn,
        }
    }

    /// Most recent durations for one variant, milliseconds, newest first.
    pub async fn durations_for(&self, variant: WorkflowVariant) -> ServerResult<Vec<u64>> {
        match variant {
            WorkflowVariant::Express => {
                self.log_driver.recent_durations(&self.express_log_group).await
            }
            WorkflowVariant::Standard => self.standard_durations().await,
        }
    }

    /// Durations for both variants. The retrievals are independent and run
    /// concurrently; each reflects its system's state as of its own call.
    pub async fn compare(&self) -> ServerResult<ComparisonResult> {
        let (express, standard) = tokio::try_join!(
            self.durations_for(WorkflowVariant::Express),
            self.durations_for(WorkflowVariant::Standard),
        )?;

        Ok(ComparisonResult { express, standard })
    }

    /// List-based durations for the standard workflow. An execution with no
    /// stop timestamp is still running; its duration is measured against now
    /// and grows on every subsequent call until it finishes. No filtering by
    /// outcome: every listed execution contributes a sample.
    async fn standard_durations(&self) -> ServerResult<Vec<u64>> {
        let records = self
            .engine
            .list_executions(&self.standard_workflow_arn, SAMPLE_LIMIT)
            .await?;

        let now = Utc::now();
        let durations = records
            .iter()
            .map(|record| {
                let stop = record.stop_date.unwrap_or(now);
                let millis = (stop - record.start_date).num_milliseconds();
                if millis < 0 {
                    warn!(
                        "Execution reports stop before start ({}ms), clamping to 0",
                        millis
                    );
                    0
                } else {
                    millis as u64
                }
            })
            .collect();

        Ok(durations)
    }
}
