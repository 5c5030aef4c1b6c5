//!
//! Flowmeter Server - latency comparison for express and standard workflow
//! executions.
//!
//! This module exports all the components of the Flowmeter Server.

use std::sync::Arc;

/// API module
pub mod api;

/// Configuration module
pub mod config;

/// Duration retrieval module
pub mod durations;

/// Workflow engine client module
pub mod engine;

/// Error module
pub mod error;

/// Log store client module
pub mod logs;

/// Server module
pub mod server;

// Re-export key types
pub use config::ServerConfig;
pub use durations::{ComparisonResult, WorkflowVariant};
pub use error::{ServerError, ServerResult};
pub use server::FlowmeterServer;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    // Create external clients
    let engine = create_workflow_engine(&config);
    let log_store = create_log_store(&config);

    // Create server
    let server = FlowmeterServer::new(config, engine, log_store);

    // Run server
    server.run().await
}

/// Initialize logging
fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Initialize subscriber
    fmt().with_env_filter(filter).with_target(true).init();
}

/// Create the workflow engine client
fn create_workflow_engine(config: &ServerConfig) -> Arc<dyn engine::WorkflowEngine> {
    tracing::info!("Using workflow engine at {}", config.engine_api_url);
    Arc::new(engine::HttpWorkflowEngine::new(
        config.engine_api_url.clone(),
        config.engine_api_token.clone(),
    ))
}

/// Create the log store client
fn create_log_store(config: &ServerConfig) -> Arc<dyn logs::LogStore> {
    tracing::info!("Using log store at {}", config.log_api_url);
    Arc::new(logs::HttpLogStore::new(
        config.log_api_url.clone(),
        config.log_api_token.clone(),
    ))
}
