//! Startup and runtime errors of the server process.
//!
//! Tool failures have their own type ([`ToolError`]) and normally end up in a
//! `CallToolResult`; this type covers what can stop a server from running.

use thiserror::Error;

use crate::core::transport::TransportError;
use crate::domains::tools::ToolError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A tool-level failure surfaced outside a tool call, e.g. while
    /// building the HTTP client.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Unreadable or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber or log file could not be set up.
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}
