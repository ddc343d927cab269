//! Public API MCP server.
//!
//! Serves the weather, IP info, dictionary and exchange rate tools over the
//! configured transport (STDIO by default).

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ops_tools_mcp_server::core::{
    Config, FetchClient, McpServer, ServerProfile, TransportService, init_logging,
};
use ops_tools_mcp_server::domains::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let profile = ServerProfile::PublicApi;
    let config = Arc::new(Config::load(profile.default_name())?);

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting {} v{}", config.server.name, config.server.version);

    let client = FetchClient::from_config(&config.http)?;
    let registry = ToolRegistry::public_api(&config, client);
    let server = McpServer::new(config.clone(), profile, registry);

    info!("Server initialized");

    let transport = TransportService::new(config.transport.clone());
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}
