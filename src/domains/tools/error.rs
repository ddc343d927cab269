//! Tool-specific error types.
//!
//! Every failed tool invocation surfaces exactly one of these variants. The
//! three validation flavours (`Validation`, `TimeRange`, `Filter`) never reach
//! the network or fixture layer.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur during tool operations.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The requested tool was not found in the registry.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// A time range parameter (hours, minutes) was out of bounds.
    #[error("{0}")]
    TimeRange(String),

    /// An enumerated filter parameter had a value outside its allowed set.
    #[error("{0}")]
    Filter(String),

    /// The tool failed internally, e.g. the upstream returned unusable data.
    #[error("{0}")]
    Execution(String),

    /// The upstream API answered with a non-2xx status, an unparseable body,
    /// or could not be reached at all.
    #[error("{message}")]
    UpstreamApi {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// The request exceeded its deadline on every attempt.
    #[error("{0}")]
    Timeout(String),

    /// Local configuration is malformed or missing.
    #[error("{0}")]
    Configuration(String),

    /// A fixture file is missing or malformed.
    #[error("{0}")]
    DataLoad(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new time range error.
    pub fn time_range(msg: impl Into<String>) -> Self {
        Self::TimeRange(msg.into())
    }

    /// Create a new filter error.
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    /// Create a new execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create an upstream API error carrying the HTTP status and raw body.
    pub fn upstream(msg: impl Into<String>, status: Option<u16>, body: Option<String>) -> Self {
        Self::UpstreamApi {
            message: msg.into(),
            status,
            body,
        }
    }

    /// Create a new timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new data load error.
    pub fn data_load(msg: impl Into<String>) -> Self {
        Self::DataLoad(msg.into())
    }

    /// Stable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::TimeRange(_) => "time_range",
            Self::Filter(_) => "filter",
            Self::Execution(_) => "execution",
            Self::UpstreamApi { .. } => "upstream_api",
            Self::Timeout(_) => "timeout",
            Self::Configuration(_) => "configuration",
            Self::DataLoad(_) => "data_load",
        }
    }

    /// True for bad input, including the time range and filter subtypes.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::TimeRange(_) | Self::Filter(_)
        )
    }

    /// The human-readable message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of an upstream failure, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UpstreamApi { status, .. } => *status,
            _ => None,
        }
    }

    /// Structured diagnostic details.
    pub fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert("kind".to_string(), json!(self.kind()));
        if let Self::UpstreamApi { status, body, .. } = self {
            if let Some(status) = status {
                details.insert("status_code".to_string(), json!(status));
            }
            if let Some(body) = body {
                details.insert("response_text".to_string(), json!(body));
            }
        }
        details
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Execution(format!("JSON error: {}", e))
    }
}
