//! Ops Tools MCP Servers
//!
//! This crate provides two Model Context Protocol (MCP) servers sharing one
//! tool contract and one infrastructure layer:
//!
//! - **public-api-server**: weather, IP geolocation, dictionary and exchange
//!   rate tools backed by free, key-less HTTP APIs
//! - **monitoring-server**: log, performance, APM and health check tools that
//!   serve YAML fixtures shaped as SQL, Elasticsearch, Prometheus and Jaeger
//!   responses
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, logging, the retrying HTTP
//!   client, the MCP server handler and the transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool contract, tool implementations and the registry
//!   - **fixtures**: cached YAML fixture loading
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ops_tools_mcp_server::core::{Config, FetchClient, McpServer, ServerProfile};
//! use ops_tools_mcp_server::domains::tools::ToolRegistry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(Config::from_env());
//!     let client = FetchClient::from_config(&config.http)?;
//!     let registry = ToolRegistry::public_api(&config, client);
//!     let server = McpServer::new(config, ServerProfile::PublicApi, registry);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
