//! Interface transfer logs, shaped as a SQL result set.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::formats::{get_or, is_truthy, sql_envelope};
use super::{string_filters, time_range};
use crate::domains::fixtures::{DataLoader, records};
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

const QUERY: &str = "SELECT * FROM interface_logs ORDER BY timestamp DESC";

fn default_system() -> String {
    "all".to_string()
}

fn default_hours() -> i64 {
    1
}

/// Parameters for the interface log tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InterfaceLogsParams {
    #[schemars(description = "System to check (HR, Policy, Payment, or 'all')")]
    #[serde(default = "default_system")]
    pub system_name: String,

    #[schemars(description = "Look back N hours from now (default: 1)")]
    #[serde(default = "default_hours")]
    pub hours: i64,

    #[schemars(description = "Status filter (SUCCESS, PENDING, ERROR), empty for all")]
    #[serde(default)]
    pub status: Option<String>,
}

pub struct InterfaceLogsTool {
    loader: Arc<DataLoader>,
}

impl InterfaceLogsTool {
    pub const NAME: &'static str = "check_interface_logs";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Check interface (I/F) transfer logs for deployment abnormalities. \
         Returns rows from the interface_logs table.",
    );

    pub fn new(loader: Arc<DataLoader>) -> Self {
        Self { loader }
    }

    fn row(log: &Value) -> Value {
        let timestamp = if is_truthy(log.get("created_at")) {
            get_or(log, "created_at", Value::Null)
        } else {
            get_or(log, "started_at", Value::Null)
        };

        json!({
            "log_id": get_or(log, "id", json!("unknown")),
            "timestamp": timestamp,
            "system_name": get_or(log, "system_name", json!("unknown")),
            "interface_name": get_or(log, "interface_name", json!("unknown")),
            "direction": get_or(log, "direction", json!("OUTBOUND")),
            "status": get_or(log, "status", json!("UNKNOWN")),
            "protocol": get_or(log, "protocol", json!("REST")),
            "source_system": get_or(log, "source_system", json!("unknown")),
            "target_system": get_or(log, "target_system", json!("unknown")),
            "record_count": get_or(log, "record_count", json!(0)),
            "bytes_transferred": get_or(log, "bytes_transferred", json!(0)),
            "duration_seconds": get_or(log, "duration_seconds", json!(0)),
            "retry_count": get_or(log, "retry_count", json!(0)),
            "error_message": get_or(log, "error_message", Value::Null),
            "correlation_id": get_or(log, "correlation_id", Value::Null),
            "trace_id": get_or(log, "trace_id", Value::Null),
        })
    }
}

#[async_trait]
impl Tool for InterfaceLogsTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<InterfaceLogsParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["system_name", "status"])?;
        time_range(params, "hours", default_hours(), "Hours must be non-negative")?;
        Ok(())
    }

    async fn execute(&self, _params: &ToolParams) -> ToolResult<ToolOutput> {
        let data = self.loader.load_interface_logs().await?;
        let rows = records(&data, "interface_logs").iter().map(Self::row).collect();
        Ok(ToolOutput::Document(sql_envelope(QUERY, rows)))
    }
}
