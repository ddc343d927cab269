//! Tool Registry - the registration table for one server.
//!
//! This module provides:
//! - The list of tools a server exposes, built once at startup
//! - Lookup and dispatch by name (used by the HTTP transport)
//! - Tool metadata for listing

use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool as McpTool};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::http::FetchClient;
use crate::domains::fixtures::DataLoader;

use super::contract::{Tool, ToolParams, error_result};
use super::definitions::api::{DictionaryTool, ExchangeRateTool, IpInfoTool, WeatherTool};
use super::definitions::monitoring::{
    ApiHealthTool, ApmTool, AppPerformanceTool, ApplicationLogsTool, AreaPerformanceTool,
    BatchLogsTool, InterfaceLogsTool, ServerPerformanceTool,
};
use super::error::ToolError;

// ============================================================================
// Tool Registry
// ============================================================================

/// Name → tool table, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools of the public API server, filtered by the feature flags.
    pub fn public_api(config: &Config, client: FetchClient) -> Self {
        let features = &config.features;
        let mut registry = Self::new();

        if features.enable_weather_tool {
            registry.register(WeatherTool::new(client.clone()));
        }
        if features.enable_ip_info_tool {
            registry.register(IpInfoTool::new(client.clone()));
        }
        if features.enable_dictionary_tool {
            registry.register(DictionaryTool::new(client.clone()));
        }
        if features.enable_exchange_rate_tool {
            registry.register(ExchangeRateTool::new(client));
        }
        registry
    }

    /// Tools of the monitoring server, all reading fixtures through `loader`.
    pub fn monitoring(config: &Config, loader: Arc<DataLoader>) -> Self {
        let thresholds = &config.thresholds;
        let mut registry = Self::new();

        registry.register(InterfaceLogsTool::new(loader.clone()));
        registry.register(BatchLogsTool::new(loader.clone()));
        registry.register(ApplicationLogsTool::new(loader.clone()));
        registry.register(ServerPerformanceTool::new(loader.clone(), thresholds.clone()));
        registry.register(AppPerformanceTool::new(loader.clone(), thresholds.clone()));
        registry.register(AreaPerformanceTool::new(loader.clone()));
        registry.register(ApmTool::new(loader.clone()));
        registry.register(ApiHealthTool::new(loader, thresholds.latency_critical_ms));
        registry
    }

    /// Add a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        let name = tool.metadata().name;
        match self.tools.iter().position(|t| t.metadata().name == name) {
            Some(index) => {
                warn!("Tool {} registered twice, keeping the latest", name);
                self.tools[index] = tool;
            }
            None => {
                debug!("Registered tool {}", name);
                self.tools.push(tool);
            }
        }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.metadata().name).collect()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.metadata().name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Both HTTP and STDIO/TCP transports list tools from here.
    pub fn to_tools(&self) -> Vec<McpTool> {
        self.tools.iter().map(|t| t.to_tool()).collect()
    }

    /// Dispatch a tool call by name.
    ///
    /// Tool failures come back as an error `CallToolResult`; only an unknown
    /// name is an `Err`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        let Some(tool) = self.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(name));
        };
        Ok(match ToolParams::from_value(arguments) {
            Ok(params) => run_tool(tool.as_ref(), &params).await,
            Err(e) => error_result(&e),
        })
    }
}

/// Invoke a tool and turn the outcome into an MCP result.
pub(crate) async fn run_tool(tool: &dyn Tool, params: &ToolParams) -> CallToolResult {
    match tool.invoke(params).await {
        Ok(output) => output.into_call_result(),
        Err(e) => error_result(&e),
    }
}

/// Arguments as sent by rmcp, for [`run_tool`].
pub(crate) fn params_from(arguments: Option<Map<String, Value>>) -> ToolParams {
    ToolParams::new(arguments.unwrap_or_default())
}
