//! Error handling for the Flowmeter Server API
//!
//! This module contains standardized error handling for the API.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, warn};

use crate::error::ServerError;

/// Convert a server error into a standardized API error response.
///
/// Validation failures are returned verbatim with 400. Everything else maps
/// to 500 with a generic message; the detail only goes to the logs so
/// external-dependency internals never leak to callers.
pub fn api_error_response(err: &ServerError) -> axum::response::Response {
    let (status_code, message) = match err {
        ServerError::ValidationError(msg) => {
            warn!("Rejected request: {}", msg);
            (StatusCode::BAD_REQUEST, msg.clone())
        }
        ServerError::ConfigurationError(msg) => {
            error!("Configuration error: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
        }
        ServerError::QueryTimeout { query_id, waited_ms } => {
            error!(
                "Duration query {} timed out after {}ms",
                query_id, waited_ms
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing request".to_string(),
            )
        }
        ServerError::EngineError(msg)
        | ServerError::LogStoreError(msg)
        | ServerError::InternalError(msg) => {
            error!("Error processing request: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing request".to_string(),
            )
        }
    };

    (status_code, Json(json!({ "message": message }))).into_response()
}
