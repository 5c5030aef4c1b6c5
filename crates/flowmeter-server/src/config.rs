//! Configuration for the Flowmeter Server
//!
//! This module contains the configuration types and loading functionality.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Base URL of the workflow engine control API
    pub engine_api_url: String,

    /// Bearer token for the workflow engine API
    #[serde(default)]
    pub engine_api_token: Option<String>,

    /// Base URL of the log aggregation store API
    pub log_api_url: String,

    /// Bearer token for the log store API
    #[serde(default)]
    pub log_api_token: Option<String>,

    /// Identifier of the express workflow
    pub express_workflow_arn: String,

    /// Identifier of the standard workflow
    pub standard_workflow_arn: String,

    /// Log group the express workflow writes execution events to
    #[serde(default = "default_express_log_group")]
    pub express_log_group: String,

    /// How far back the duration query looks, in hours
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,

    /// Interval between query status polls, in milliseconds
    #[serde(default = "default_query_poll_interval_ms")]
    pub query_poll_interval_ms: u64,

    /// Deadline for an aggregation query to finish, in seconds
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_express_log_group() -> String {
    "/workflow/express-state-machine".to_string()
}

fn default_lookback_hours() -> u64 {
    24
}

fn default_query_poll_interval_ms() -> u64 {
    1000
}

fn default_query_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override from environment variables
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                warn!("Invalid SERVER_PORT value: {}", port);
            }
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Ok(engine_api_url) = env::var("ENGINE_API_URL") {
            config.engine_api_url = engine_api_url;
        }

        if let Ok(engine_api_token) = env::var("ENGINE_API_TOKEN") {
            config.engine_api_token = Some(engine_api_token);
        }

        if let Ok(log_api_url) = env::var("LOG_API_URL") {
            config.log_api_url = log_api_url;
        }

        if let Ok(log_api_token) = env::var("LOG_API_TOKEN") {
            config.log_api_token = Some(log_api_token);
        }

        if let Ok(arn) = env::var("EXPRESS_STATE_MACHINE_ARN") {
            config.express_workflow_arn = arn;
        }

        if let Ok(arn) = env::var("STANDARD_STATE_MACHINE_ARN") {
            config.standard_workflow_arn = arn;
        }

        if let Ok(log_group) = env::var("EXPRESS_LOG_GROUP") {
            config.express_log_group = log_group;
        }

        if let Ok(lookback) = env::var("DURATION_LOOKBACK_HOURS") {
            if let Ok(hours) = lookback.parse::<u64>() {
                config.lookback_hours = hours;
            } else {
                warn!("Invalid DURATION_LOOKBACK_HOURS value: {}", lookback);
            }
        }

        if let Ok(interval) = env::var("QUERY_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse::<u64>() {
                config.query_poll_interval_ms = ms;
            } else {
                warn!("Invalid QUERY_POLL_INTERVAL_MS value: {}", interval);
            }
        }

        if let Ok(timeout) = env::var("QUERY_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.query_timeout_secs = secs;
            } else {
                warn!("Invalid QUERY_TIMEOUT_SECS value: {}", timeout);
            }
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;

        info!("Loaded server configuration");
        Ok(config)
    }

    /// Validate required fields
    pub fn validate(&self) -> ServerResult<()> {
        if self.engine_api_url.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Workflow engine API URL is required".to_string(),
            ));
        }

        if self.log_api_url.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Log store API URL is required".to_string(),
            ));
        }

        if self.express_workflow_arn.is_empty() || self.standard_workflow_arn.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Workflow identifiers not found in environment variables".to_string(),
            ));
        }

        // Warn for missing optional fields
        if self.engine_api_token.is_none() {
            warn!("No ENGINE_API_TOKEN provided - engine calls will be unauthenticated!");
        }

        if self.log_api_token.is_none() {
            warn!("No LOG_API_TOKEN provided - log store calls will be unauthenticated!");
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            engine_api_url: String::new(),
            engine_api_token: None,
            log_api_url: String::new(),
            log_api_token: None,
            express_workflow_arn: String::new(),
            standard_workflow_arn: String::new(),
            express_log_group: default_express_log_group(),
            lookback_hours: default_lookback_hours(),
            query_poll_interval_ms: default_query_poll_interval_ms(),
            query_timeout_secs: default_query_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}
