//! Tools that serve canned monitoring data from YAML fixtures.
//!
//! Filter parameters (system, service, node, status, search pattern...) are
//! validated but not applied: every tool returns all records of its dataset.
//! Time ranges must be non-negative and enumerated choices must be in their
//! allowed set. Only shaping parameters such as `metric_type` change the
//! output.

mod api_health;
mod apm;
mod app_performance;
mod application_logs;
mod area_performance;
mod batch_logs;
pub mod formats;
mod interface_logs;
mod server_performance;

pub use api_health::{ApiHealthParams, ApiHealthTool};
pub use apm::{ApmParams, ApmTool};
pub use app_performance::{AppPerformanceParams, AppPerformanceTool};
pub use application_logs::{ApplicationLogsParams, ApplicationLogsTool};
pub use area_performance::{AreaPerformanceParams, AreaPerformanceTool};
pub use batch_logs::{BatchLogsParams, BatchLogsTool};
pub use interface_logs::{InterfaceLogsParams, InterfaceLogsTool};
pub use server_performance::{ServerPerformanceParams, ServerPerformanceTool};

use crate::domains::tools::contract::ToolParams;
use crate::domains::tools::{ToolError, ToolResult};

/// Read an integer time range and reject negative values.
fn time_range(params: &ToolParams, key: &str, default: i64, message: &str) -> ToolResult<i64> {
    let value = params.i64_or(key, default)?;
    if value < 0 {
        return Err(ToolError::time_range(message));
    }
    Ok(value)
}

/// Read an enumerated choice and reject values outside `allowed`.
fn choice<'a>(
    params: &'a ToolParams,
    key: &str,
    default: &'a str,
    allowed: &[&str],
    message: &str,
) -> ToolResult<&'a str> {
    let value = params.str_or(key, default)?;
    if !allowed.contains(&value) {
        return Err(ToolError::filter(format!("{}: {}", message, allowed.join(", "))));
    }
    Ok(value)
}

/// Check that optional filter parameters, when given, are strings.
fn string_filters(params: &ToolParams, keys: &[&str]) -> ToolResult<()> {
    for key in keys {
        params.optional_str(key)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixture directory for the monitoring tool tests.

    use std::path::Path;
    use std::sync::Arc;

    use serde_json::Value;
    use tempfile::TempDir;

    use crate::domains::fixtures::DataLoader;
    use crate::domains::tools::contract::ToolParams;

    pub fn write(dir: &Path, path: &str, content: &str) {
        let full = dir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    /// A loader over a temporary directory holding a single fixture file.
    pub fn loader_with(path: &str, content: &str) -> (TempDir, Arc<DataLoader>) {
        let dir = TempDir::new().unwrap();
        write(dir.path(), path, content);
        let loader = Arc::new(DataLoader::new(dir.path()));
        (dir, loader)
    }

    /// A loader over an empty temporary directory.
    pub fn empty_loader() -> (TempDir, Arc<DataLoader>) {
        let dir = TempDir::new().unwrap();
        let loader = Arc::new(DataLoader::new(dir.path()));
        (dir, loader)
    }

    /// A loader over the fixtures shipped in the repository.
    pub fn bundled_loader() -> Arc<DataLoader> {
        Arc::new(DataLoader::new(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("data"),
        ))
    }

    pub fn params(value: Value) -> ToolParams {
        ToolParams::from_value(value).unwrap()
    }
}
