//! Tools domain module.
//!
//! Tools are executable functions that MCP clients call by name.
//!
//! ## Architecture
//!
//! - `contract.rs` - The `Tool` trait, parameters and outputs
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `registry.rs` - Registration table per server and HTTP dispatch
//! - `router.rs` - rmcp ToolRouter builder for STDIO/TCP transport
//! - `error.rs` - Tool error taxonomy
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/api/` or `definitions/monitoring/`
//! 2. Define a params struct and implement `Tool` (metadata, schema, validate, execute)
//! 3. Export it from the group's `mod.rs`
//! 4. Register it in `ToolRegistry::public_api` or `ToolRegistry::monitoring`
//!
//! The router and both transports pick it up from the registry.

pub mod contract;
pub mod definitions;
mod error;
mod registry;
pub mod router;

pub use contract::{Tool, ToolMetadata, ToolOutput, ToolParams};
pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use router::build_tool_router;
