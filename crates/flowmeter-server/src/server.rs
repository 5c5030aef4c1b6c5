//! Main Flowmeter Server implementation
//!
//! This module contains the FlowmeterServer implementation.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::durations::{ComparisonResult, DurationResolver, LogQueryDriver, WorkflowVariant};
use crate::engine::WorkflowEngine;
use crate::error::ServerResult;
use crate::logs::LogStore;

/// Main server implementation
///
/// Holds read-only configuration and the external collaborator handles.
/// There is no mutable state shared across requests.
#[derive(Debug, Clone)]
pub struct FlowmeterServer {
    /// Configuration
    pub config: ServerConfig,

    /// Workflow engine client
    engine: Arc<dyn WorkflowEngine>,

    /// Log store client
    log_store: Arc<dyn LogStore>,

    /// Duration retrieval strategies
    resolver: DurationResolver,
}

impl FlowmeterServer {
    /// Create a new FlowmeterServer
    pub fn new(
        config: ServerConfig,
        engine: Arc<dyn WorkflowEngine>,
        log_store: Arc<dyn LogStore>,
    ) -> Self {
        let log_driver = LogQueryDriver::new(
            log_store.clone(),
            config.lookback_hours,
            Duration::from_millis(config.query_poll_interval_ms),
            Duration::from_secs(config.query_timeout_secs),
        );
        let resolver = DurationResolver::new(
            engine.clone(),
            log_driver,
            config.express_log_group.clone(),
            config.standard_workflow_arn.clone(),
        );

        Self {
            config,
            engine,
            log_store,
            resolver,
        }
    }

    /// The engine-side identifier for a variant's workflow
    fn workflow_arn(&self, variant: WorkflowVariant) -> &str {
        match variant {
            WorkflowVariant::Express => &self.config.express_workflow_arn,
            WorkflowVariant::Standard => &self.config.standard_workflow_arn,
        }
    }

    /// Start one execution of the given variant's workflow, forwarding the
    /// caller's raw payload as execution input. Does not wait for completion.
    pub async fn start_execution(
        &self,
        variant: WorkflowVariant,
        input: Value,
    ) -> ServerResult<String> {
        info!("Starting {} workflow execution", variant.as_str());
        self.engine
            .start_execution(self.workflow_arn(variant), input)
            .await
    }

    /// Start one execution of each variant concurrently and wait for both
    /// start calls to be acknowledged. Either both handles are returned or
    /// the whole operation fails.
    pub async fn start_both(&self, input: Value) -> ServerResult<(String, String)> {
        info!("Starting executions of both workflow variants");
        tokio::try_join!(
            self.start_execution(WorkflowVariant::Express, input.clone()),
            self.start_execution(WorkflowVariant::Standard, input),
        )
    }

    /// Most recent execution durations for one variant.
    pub async fn durations_for(&self, variant: WorkflowVariant) -> ServerResult<Vec<u64>> {
        self.resolver.durations_for(variant).await
    }

    /// Most recent execution durations for both variants.
    pub async fn compare_durations(&self) -> ServerResult<ComparisonResult> {
        self.resolver.compare().await
    }

    /// Probe the workflow engine
    pub async fn check_engine_health(&self) -> ServerResult<bool> {
        self.engine.health_check().await
    }

    /// Probe the log store
    pub async fn check_log_store_health(&self) -> ServerResult<bool> {
        self.log_store.health_check().await
    }

    /// Run the server
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting Flowmeter Server");

        let bind_address = format!("{}:{}", self.config.bind_address, self.config.port);

        // Build the API router
        let app = crate::api::build_router(Arc::new(self));

        // Create and bind the TCP listener
        let listener = TcpListener::bind(&bind_address).await?;
        info!("Listening on {}", listener.local_addr()?);

        // Run the server
        axum::serve(listener, app).await?;

        Ok(())
    }
}
