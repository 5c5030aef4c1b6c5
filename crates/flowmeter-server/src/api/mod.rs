//! API module for the Flowmeter Server
//!
//! This module contains the API routes and handlers for the Flowmeter
//! Server.

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod errors;
pub mod health;

use crate::durations::WorkflowVariant;
use crate::error::ServerError;
use crate::server::FlowmeterServer;
use errors::api_error_response;

/// Build the router for API endpoints
pub fn build_router(server: Arc<FlowmeterServer>) -> Router {
    Router::new()
        // Command dispatch
        .route("/v1/command", post(handle_command))
        // Health check
        .route("/health", get(health::health_check))
        // Request tracing
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(server)
}

/// Handler for the command endpoint
///
/// Dispatches `start` and `list` commands. The full payload, `cmd` included,
/// is forwarded as execution input on `start`. Omitting `stateMachine`
/// addresses both variants. All validation happens before any external call.
async fn handle_command(
    State(server): State<Arc<FlowmeterServer>>,
    Json(payload): Json<Value>,
) -> Response {
    // Resolve the requested variant, if any, before touching collaborators
    let variant = match payload.get("stateMachine") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => match WorkflowVariant::parse(name) {
            Some(variant) => Some(variant),
            None => {
                return api_error_response(&ServerError::ValidationError(
                    "Invalid stateMachine type. Must be EXPRESS or STANDARD.".to_string(),
                ));
            }
        },
        Some(_) => {
            return api_error_response(&ServerError::ValidationError(
                "Invalid stateMachine type. Must be EXPRESS or STANDARD.".to_string(),
            ));
        }
    };

    match payload.get("cmd").and_then(Value::as_str) {
        Some("start") => handle_start(&server, variant, payload.clone()).await,
        Some("list") => handle_list(&server, variant).await,
        _ => api_error_response(&ServerError::ValidationError(
            "Invalid command. Must be \"start\" or \"list\".".to_string(),
        )),
    }
}

/// Start one or both workflow executions
async fn handle_start(
    server: &FlowmeterServer,
    variant: Option<WorkflowVariant>,
    input: Value,
) -> Response {
    match variant {
        Some(variant) => match server.start_execution(variant, input).await {
            Ok(execution_arn) => Json(json!({
                "message": "Workflow has started its execution",
                "executionArn": execution_arn,
            }))
            .into_response(),
            Err(err) => api_error_response(&err),
        },
        None => match server.start_both(input).await {
            Ok((express_arn, standard_arn)) => Json(json!({
                "message": "Both workflows have started their executions",
                "expressExecutionArn": express_arn,
                "standardExecutionArn": standard_arn,
            }))
            .into_response(),
            Err(err) => api_error_response(&err),
        },
    }
}

/// Retrieve recent execution durations for one or both variants
async fn handle_list(server: &FlowmeterServer, variant: Option<WorkflowVariant>) -> Response {
    match variant {
        Some(variant) => match server.durations_for(variant).await {
            Ok(durations) => Json(json!({
                "message": "Last 10 execution durations retrieved",
                "durations": durations,
            }))
            .into_response(),
            Err(err) => api_error_response(&err),
        },
        None => match server.compare_durations().await {
            Ok(result) => Json(json!({
                "message": "Last 10 execution durations retrieved for both workflows",
                "durationsExpress": result.express,
                "durationsStandard": result.standard,
            }))
            .into_response(),
            Err(err) => api_error_response(&err),
        },
    }
}
