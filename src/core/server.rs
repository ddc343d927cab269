//! MCP Server implementation and lifecycle management.
//!
//! This module contains the server handler that implements the MCP protocol
//! on top of a [`ToolRegistry`].
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool
//! and registered per server profile in `domains/tools/registry.rs`. The
//! rmcp ToolRouter is built from the registry, so adding a tool never
//! requires touching this file.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use crate::domains::tools::{ToolError, ToolRegistry, build_tool_router};

/// Which of the two servers this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerProfile {
    /// Weather, IP info, dictionary and exchange rate tools.
    PublicApi,
    /// Log, metric, trace and health check tools over fixtures.
    Monitoring,
}

impl ServerProfile {
    /// Default server name reported to clients.
    pub fn default_name(self) -> &'static str {
        match self {
            Self::PublicApi => "public-api-server",
            Self::Monitoring => "monitoring-server",
        }
    }

    /// Usage instructions sent to clients on initialize.
    pub fn instructions(self) -> &'static str {
        match self {
            Self::PublicApi => {
                "Public API tools: current weather by location, IP geolocation, \
                 English dictionary lookups and currency exchange rates. No API keys needed."
            }
            Self::Monitoring => {
                "Monitoring tools: interface, batch and application logs; server and \
                 application performance; APM traces and metrics; API health checks. \
                 Results use SQL, Elasticsearch, Prometheus and Jaeger response formats."
            }
        }
    }
}

/// The MCP server handler.
///
/// Implements `ServerHandler` from rmcp and routes tool calls to the
/// registry the server was built with.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    profile: ServerProfile,

    /// Tools exposed by this server.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a server exposing the tools of `registry`.
    pub fn new(config: Arc<Config>, profile: ServerProfile, registry: ToolRegistry) -> Self {
        info!(
            "Building {:?} server with {} tool(s): {}",
            profile,
            registry.len(),
            registry.tool_names().join(", ")
        );
        Self {
            tool_router: build_tool_router::<Self>(&registry),
            registry: Arc::new(registry),
            profile,
            config,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn profile(&self) -> ServerProfile {
        self.profile
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.registry
            .to_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Returns the serialized `CallToolResult`; an unknown tool name is the
    /// only error.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let result = self.registry.call_tool(name, arguments).await?;
        Ok(serde_json::to_value(result)?)
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.profile.instructions().to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fixtures::DataLoader;
    use serde_json::json;

    fn monitoring_server() -> McpServer {
        let config = Arc::new(Config::default());
        let registry = ToolRegistry::monitoring(&config, Arc::new(DataLoader::new("data")));
        McpServer::new(config, ServerProfile::Monitoring, registry)
    }

    #[test]
    fn test_server_info() {
        let server = monitoring_server();
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.instructions.unwrap().contains("Prometheus"));
        assert_eq!(info.server_info.name, server.name());
    }

    #[test]
    fn test_list_tools_matches_registry() {
        let server = monitoring_server();
        let tools = server.list_tools();
        assert_eq!(tools.len(), server.registry().len());
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_call_tool_unknown() {
        let server = monitoring_server();
        let err = server.call_tool("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_call_tool_error_result() {
        let server = monitoring_server();
        let result = server
            .call_tool("check_interface_logs", json!({"hours": -2}))
            .await
            .unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Hours must be non-negative");
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(ServerProfile::PublicApi.default_name(), "public-api-server");
        assert_eq!(ServerProfile::Monitoring.default_name(), "monitoring-server");
    }
}
