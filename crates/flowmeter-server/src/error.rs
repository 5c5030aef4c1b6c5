//! Error types for the Flowmeter Server
//!
//! This module contains the error types used throughout the server.

use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Workflow engine error
    #[error("Workflow engine error: {0}")]
    EngineError(String),

    /// Log store error
    #[error("Log store error: {0}")]
    LogStoreError(String),

    /// Aggregation query did not reach a terminal state before the deadline
    #[error("Query {query_id} still running after {waited_ms}ms")]
    QueryTimeout {
        /// Identifier of the server-side query job
        query_id: String,
        /// How long the poll loop waited before giving up
        waited_ms: u64,
    },

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

// Implement conversions from other error types
impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::InternalError(format!("HTTP request error: {}", err))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl ServerError {
    /// Check if the error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ServerError::ValidationError(_))
    }

    /// Check if the error is a query timeout
    pub fn is_query_timeout(&self) -> bool {
        matches!(self, ServerError::QueryTimeout { .. })
    }
}
