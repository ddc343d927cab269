//! Transports the MCP servers can run on.
//!
//! Each transport is behind a cargo feature:
//! - `stdio` (default): one client over stdin/stdout, the usual MCP setup
//! - `tcp`: line-delimited JSON-RPC, one rmcp session per connection
//! - `http`: JSON-RPC over POST plus `/health`, served by axum
//!
//! STDIO and TCP hand the connection to rmcp, which routes tool calls
//! through the server's `ToolRouter`. HTTP decodes JSON-RPC itself and
//! dispatches through the `ToolRegistry`. Both paths produce the same
//! tool results.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
