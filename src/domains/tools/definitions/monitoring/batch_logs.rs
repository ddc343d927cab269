//! Batch job history, shaped as a SQL result set.

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

const QUERY: &str = "SELECT * FROM batch_job_logs ORDER BY start_time DESC";
const DEFAULT_ERROR_LOG: &str = "ERROR: Job execution failed\nDETAIL: See log file for details";

fn default_job() -> String {
    "all".to_string()
}

fn default_hours() -> i64 {
    24
}

/// Parameters for the batch log tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BatchLogsParams {
    #[schemars(description = "Batch job name or 'all'")]
    #[serde(default = "default_job")]
    pub job_name: String,

    #[schemars(description = "Look back N hours (default: 24)")]
    #[serde(default = "default_hours")]
    pub hours: i64,

    #[schemars(description = "Status filter (SUCCESS, FAILED, RUNNING), empty for all")]
    #[serde(default)]
    pub status: Option<String>,
}

pub struct BatchLogsTool {
    loader: Arc<DataLoader>,
}

impl BatchLogsTool {
    pub const NAME: &'static str = "check_batch_logs";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Check batch job results for abnormalities. Returns rows from the \
         batch_job_logs table.",
    );

    pub fn new(loader: Arc<DataLoader>) -> Self {
        Self { loader }
    }

    fn row(job: &Value) -> Value {
        let status = get_or(job, "status", json!("UNKNOWN"));
        let exit_code = match status.as_str() {
            Some("SUCCESS") => json!(0),
            Some("FAILED") => json!(1),
            _ => Value::Null,
        };
        let job_id = get_or(job, "job_id", json!("unknown"));
        let log_file = match &job_id {
            Value::String(id) => format!("/var/log/batch/{}.log", id),
            other => format!("/var/log/batch/{}.log", other),
        };

        let mut row = json!({
            "job_id": job_id,
            "job_name": get_or(job, "job_name", json!("unknown")),
            "job_group": get_or(job, "job_group", json!("DEFAULT")),
            "job_type": get_or(job, "job_type", json!("BATCH")),
            "priority": get_or(job, "priority", json!("NORMAL")),
            "status": status,
            "scheduled_time": get_or(job, "scheduled_time", Value::Null),
            "start_time": get_or(job, "start_time", Value::Null),
            "end_time": get_or(job, "end_time", Value::Null),
            "duration_seconds": get_or(job, "duration_seconds", json!(0)),
            "exit_code": exit_code,
            "records_processed": get_or(job, "records_processed", json!(0)),
            "records_failed": get_or(job, "records_failed", json!(0)),
            "retry_count": get_or(job, "retry_count", json!(0)),
            "max_retries": get_or(job, "max_retries", json!(3)),
            "run_as_user": get_or(job, "run_as_user", json!("batch")),
            "host": get_or(job, "host", json!("batch-server-01")),
            "correlation_id": get_or(job, "correlation_id", Value::Null),
            "log_file": log_file,
        });

        if let Some(columns) = row.as_object_mut() {
            if let Some(usage) = job.get("resource_usage").filter(|u| is_truthy(Some(u))) {
                for key in ["cpu_percent_avg", "memory_mb_peak", "disk_io_mb"] {
                    columns.insert(key.to_string(), get_or(usage, key, Value::Null));
                }
            }
            if job.get("status").and_then(Value::as_str) == Some("FAILED") {
                columns.insert(
                    "error_log".to_string(),
                    get_or(job, "error_message", json!(DEFAULT_ERROR_LOG)),
                );
            }
        }
        row
    }
}

#[async_trait]
impl Tool for BatchLogsTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<BatchLogsParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["job_name", "status"])?;
        time_range(params, "hours", default_hours(), "Hours must be non-negative")?;
        Ok(())
    }

    async fn execute(&self, _params: &ToolParams) -> ToolResult<ToolOutput> {
        let data = self.loader.load_batch_logs().await?;
        let rows = records(&data, "batch_jobs").iter().map(Self::row).collect();
        Ok(ToolOutput::Document(sql_envelope(QUERY, rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fixtures::datasets;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::definitions::monitoring::testing::{empty_loader, loader_with, params};

    const FIXTURE: &str = r#"
batch_jobs:
  - job_id: BATCH-001
    job_name: premium_calc
    status: SUCCESS
    start_time: "2026-10-19T01:00:00Z"
    records_processed: 5000
    resource_usage:
      cpu_percent_avg: 45.5
      memory_mb_peak: 2048
  - job_id: BATCH-002
    job_name: membership_sync
    status: FAILED
  - job_id: BATCH-003
    job_name: data_export
    status: FAILED
    error_message: "ORA-00060: deadlock detected"
  - job_name: report_generation
    status: RUNNING
"#;

    #[tokio::test]
    async fn test_batch_rows() {
        let (_dir, loader) = loader_with(datasets::BATCH_LOGS, FIXTURE);
        let tool = BatchLogsTool::new(loader);
        let output = tool.invoke(&params(json!({"status": "FAILED"}))).await.unwrap();
        let doc = output.value();

        assert_eq!(doc["query"], QUERY);
        assert_eq!(doc["rowCount"], 4);
        let rows = doc["rows"].as_array().unwrap();

        assert_eq!(rows[0]["exit_code"], 0);
        assert_eq!(rows[0]["cpu_percent_avg"], 45.5);
        assert_eq!(rows[0]["memory_mb_peak"], 2048);
        assert!(rows[0]["disk_io_mb"].is_null());
        assert!(rows[0].get("error_log").is_none());
        assert_eq!(rows[0]["log_file"], "/var/log/batch/BATCH-001.log");
        assert_eq!(rows[0]["job_group"], "DEFAULT");
        assert_eq!(rows[0]["max_retries"], 3);

        assert_eq!(rows[1]["exit_code"], 1);
        assert_eq!(rows[1]["error_log"], DEFAULT_ERROR_LOG);
        assert!(rows[1].get("cpu_percent_avg").is_none());

        assert_eq!(rows[2]["error_log"], "ORA-00060: deadlock detected");

        assert!(rows[3]["exit_code"].is_null());
        assert_eq!(rows[3]["job_id"], "unknown");
        assert_eq!(rows[3]["log_file"], "/var/log/batch/unknown.log");
    }

    #[tokio::test]
    async fn test_validation() {
        let (_dir, loader) = empty_loader();
        let tool = BatchLogsTool::new(loader);

        let err = tool.invoke(&params(json!({"hours": -5}))).await.unwrap_err();
        assert!(matches!(err, ToolError::TimeRange(_)));

        let err = tool.invoke(&params(json!({"job_name": 42}))).await.unwrap_err();
        assert!(err.is_validation());
    }
}
