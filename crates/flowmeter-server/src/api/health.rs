//! Health check endpoint for the Flowmeter Server
//!
//! This module contains the health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::server::FlowmeterServer;

/// Health check handler
///
/// Reports server liveness plus reachability of the workflow engine and the
/// log store.
pub async fn health_check(State(server): State<Arc<FlowmeterServer>>) -> impl IntoResponse {
    let engine_status = match server.check_engine_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(_) => "DOWN",
    };

    let log_store_status = match server.check_log_store_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(_) => "DOWN",
    };

    let response = json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "workflowEngine": { "status": engine_status },
            "logStore": { "status": log_store_status },
        },
    });

    let overall_status = if engine_status == "DOWN" || log_store_status == "DOWN" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (overall_status, Json(response))
}
