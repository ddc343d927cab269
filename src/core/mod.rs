//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks shared by both MCP
//! servers: error handling, configuration, logging, the outbound HTTP client,
//! server lifecycle management, and transport layer abstractions.

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{FetchClient, HttpTransport, RetryPolicy};
pub use logging::init_logging;
pub use server::{McpServer, ServerProfile};
pub use transport::{TransportConfig, TransportService};
