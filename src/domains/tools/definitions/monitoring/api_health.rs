//! HTTP endpoint health checks as a Prometheus vector.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::formats::{get_or, num, prometheus_vector, sample, sample_value, str_or, unix_now};
use super::string_filters;
use crate::domains::fixtures::{DataLoader, records};
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

fn default_service_name() -> String {
    "all".to_string()
}

/// Parameters for the API health tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApiHealthParams {
    #[schemars(description = "Service name, e.g. 'payment-service', or 'all'")]
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

pub struct ApiHealthTool {
    loader: Arc<DataLoader>,
    slow_threshold_ms: f64,
}

impl ApiHealthTool {
    pub const NAME: &'static str = "check_api_health";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Check HTTP API health from recorded health check results. Returns \
         availability, status code, response time and slow-response series \
         as Prometheus query results.",
    );

    /// `slow_threshold_ms` marks checks slower than it as slow responses.
    pub fn new(loader: Arc<DataLoader>, slow_threshold_ms: f64) -> Self {
        Self {
            loader,
            slow_threshold_ms,
        }
    }

    /// One record per check, with endpoint fields underneath the check's own.
    fn flatten(endpoints: &[Value]) -> Vec<Value> {
        let mut out = Vec::new();
        for endpoint in endpoints {
            let checks = endpoint.get("checks").and_then(Value::as_array);
            for check in checks.into_iter().flatten() {
                let mut merged = Map::new();
                for (key, default) in [
                    ("endpoint_id", json!("unknown")),
                    ("url", json!("")),
                    ("name", json!("")),
                    ("service", json!("unknown")),
                    ("environment", json!("production")),
                    ("region", json!("unknown")),
                    ("method", json!("GET")),
                    ("expected_status_code", json!(200)),
                ] {
                    merged.insert(key.to_string(), get_or(endpoint, key, default));
                }
                if let Some(fields) = check.as_object() {
                    merged.extend(fields.clone());
                }
                out.push(Value::Object(merged));
            }
        }
        out
    }

    fn series(&self, check: &Value, ts: i64) -> Vec<Value> {
        let service = get_or(check, "service", json!("unknown"));
        let url = get_or(check, "url", json!(""));
        let region = get_or(check, "region", json!("unknown"));
        let environment = get_or(check, "environment", json!("production"));
        let status = str_or(check, "status", "UNKNOWN");
        let status_code = get_or(check, "status_code", json!(0));
        let expected = get_or(check, "expected_status_code", json!(200));
        let response_time = num(check, "response_time_ms");

        let up = if status == "UP" { "1" } else { "0" };
        let codes_match = match (status_code.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => status_code == expected,
        };
        let weight = match status {
            "UP" => "1",
            "DEGRADED" => "0.5",
            "RATE_LIMITED" => "0.3",
            _ => "0",
        };
        let slow = if response_time > self.slow_threshold_ms { "1" } else { "0" };

        vec![
            sample(
                json!({
                    "__name__": "api_health_up",
                    "service": service,
                    "url": url,
                    "region": region,
                    "environment": environment,
                }),
                ts,
                up,
            ),
            sample(
                json!({
                    "__name__": "api_health_status_code",
                    "service": service,
                    "url": url,
                    "region": region,
                }),
                ts,
                sample_value(Some(&status_code)),
            ),
            sample(
                json!({
                    "__name__": "api_health_response_time_ms",
                    "service": service,
                    "url": url,
                    "region": region,
                }),
                ts,
                sample_value(check.get("response_time_ms")),
            ),
            sample(
                json!({
                    "__name__": "api_health_status_code_match",
                    "service": service,
                    "url": url,
                    "expected_code": sample_value(Some(&expected)),
                }),
                ts,
                if codes_match { "1" } else { "0" },
            ),
            sample(
                json!({
                    "__name__": "api_health_status",
                    "service": service,
                    "url": url,
                    "status": status,
                }),
                ts,
                weight,
            ),
            sample(
                json!({
                    "__name__": "api_health_slow_response",
                    "service": service,
                    "url": url,
                    "threshold_ms": format!("{}", self.slow_threshold_ms),
                }),
                ts,
                slow,
            ),
        ]
    }
}

#[async_trait]
impl Tool for ApiHealthTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ApiHealthParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["service_name"])
    }

    async fn execute(&self, _params: &ToolParams) -> ToolResult<ToolOutput> {
        let data = self.loader.load_health_check_data().await?;
        let ts = unix_now();
        let result = Self::flatten(records(&data, "health_check_endpoints"))
            .iter()
            .flat_map(|check| self.series(check, ts))
            .collect();
        Ok(ToolOutput::Document(prometheus_vector(result)))
    }
}
