//! Monitoring MCP server.
//!
//! Serves log, performance, APM and health check tools backed by the YAML
//! fixtures under the configured data directory.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use ops_tools_mcp_server::core::{Config, McpServer, ServerProfile, TransportService, init_logging};
use ops_tools_mcp_server::domains::fixtures::DataLoader;
use ops_tools_mcp_server::domains::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let profile = ServerProfile::Monitoring;
    let config = Arc::new(Config::load(profile.default_name())?);

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting {} v{}", config.server.name, config.server.version);

    let data_path = &config.data.base_path;
    if !data_path.is_dir() {
        warn!(
            "Data directory {} does not exist, tool calls will fail",
            data_path.display()
        );
    }
    let loader = Arc::new(DataLoader::new(data_path.clone()));
    let registry = ToolRegistry::monitoring(&config, loader);
    let server = McpServer::new(config.clone(), profile, registry);

    info!("Server initialized");

    let transport = TransportService::new(config.transport.clone());
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}
