//! Per-endpoint application performance as a Prometheus vector.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::formats::{float_value, get_or, prometheus_vector, sample, sample_value, threshold_status, unix_now};
use super::{string_filters, time_range};
use crate::core::config::ThresholdsConfig;
use crate::domains::fixtures::{DataLoader, records};
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

const LATENCY_QUANTILES: [(&str, &str, &str); 3] = [
    ("0.50", "trace_duration_p50_ms", "avg_latency_ms"),
    ("0.95", "trace_duration_p95_ms", "p95_latency_ms"),
    ("0.99", "trace_duration_p99_ms", "p99_latency_ms"),
];

fn default_service() -> String {
    "all".to_string()
}

fn default_minutes() -> i64 {
    5
}

/// Parameters for the application performance tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AppPerformanceParams {
    #[schemars(description = "Service name or 'all'")]
    #[serde(default = "default_service")]
    pub service: String,

    #[schemars(description = "Specific endpoint, empty for all")]
    #[serde(default)]
    pub endpoint: Option<String>,

    #[schemars(description = "Time range in minutes (default: 5)")]
    #[serde(default = "default_minutes")]
    pub minutes: i64,
}

pub struct AppPerformanceTool {
    loader: Arc<DataLoader>,
    thresholds: ThresholdsConfig,
}

impl AppPerformanceTool {
    pub const NAME: &'static str = "view_application_performance";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "View application-level performance metrics (latency, throughput, \
         error rates) per endpoint as Prometheus query results.",
    );

    pub fn new(loader: Arc<DataLoader>, thresholds: ThresholdsConfig) -> Self {
        Self { loader, thresholds }
    }

    fn series(&self, record: &Value, ts: i64) -> Vec<Value> {
        let empty = json!({});
        let nested = record.get("metrics").filter(|m| m.is_object()).unwrap_or(&empty);
        let service = get_or(record, "service", json!("unknown"));
        let endpoint = record
            .get("operation")
            .or_else(|| record.get("endpoint"))
            .cloned()
            .unwrap_or_else(|| json!("N/A"));

        let labels = |name: &str| {
            json!({
                "__name__": name,
                "service": service,
                "endpoint": endpoint,
            })
        };
        let with = |mut metric: Value, key: &str, value: &str| {
            if let Some(map) = metric.as_object_mut() {
                map.insert(key.to_string(), json!(value));
            }
            metric
        };

        let mut out = Vec::with_capacity(6);
        for (quantile, nested_key, flat_key) in LATENCY_QUANTILES {
            let value = pick(nested, nested_key, record, flat_key);
            let status = threshold_status(
                value.as_f64().unwrap_or(0.0),
                self.thresholds.latency_warning_ms,
                self.thresholds.latency_critical_ms,
            );
            let metric = with(labels("app_request_latency_ms"), "quantile", quantile);
            out.push(sample(with(metric, "status", status), ts, sample_value(Some(&value))));
        }

        let error_rate = pick(nested, "error_rate_percent", record, "error_rate_percent");
        let status = threshold_status(
            error_rate.as_f64().unwrap_or(0.0),
            self.thresholds.error_rate_warning,
            self.thresholds.error_rate_critical,
        );
        out.push(sample(
            with(labels("app_error_rate_percent"), "status", status),
            ts,
            sample_value(Some(&error_rate)),
        ));

        let throughput = pick(nested, "request_rate_per_sec", record, "throughput_rps");
        out.push(sample(labels("app_throughput_rps"), ts, sample_value(Some(&throughput))));

        out.push(sample(labels("app_request_count"), ts, request_count(nested, record)));
        out
    }
}

/// `nested[key]` if present, else `record[fallback]`, else `0`.
fn pick(nested: &Value, key: &str, record: &Value, fallback: &str) -> Value {
    nested
        .get(key)
        .or_else(|| record.get(fallback))
        .cloned()
        .unwrap_or_else(|| json!(0))
}

/// Successful plus failed calls, or the flat `request_count` when that sum is zero.
fn request_count(nested: &Value, record: &Value) -> String {
    let part = |key: &str| nested.get(key).cloned().unwrap_or_else(|| json!(0));
    let (success, errors) = (part("success_count"), part("error_count"));

    let total = match (success.as_i64(), errors.as_i64()) {
        (Some(s), Some(e)) => (s + e != 0).then(|| (s + e).to_string()),
        _ => {
            let sum = success.as_f64().unwrap_or(0.0) + errors.as_f64().unwrap_or(0.0);
            (sum != 0.0).then(|| float_value(sum))
        }
    };
    total.unwrap_or_else(|| sample_value(Some(&get_or(record, "request_count", json!(0)))))
}

#[async_trait]
impl Tool for AppPerformanceTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<AppPerformanceParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["service", "endpoint"])?;
        time_range(params, "minutes", default_minutes(), "Minutes must be non-negative")?;
        Ok(())
    }

    async fn execute(&self, _params: &ToolParams) -> ToolResult<ToolOutput> {
        let data = self.loader.load_apm_data().await?;
        let ts = unix_now();
        let result = records(&data, "apm_metrics")
            .iter()
            .flat_map(|record| self.series(record, ts))
            .collect();
        Ok(ToolOutput::Document(prometheus_vector(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fixtures::datasets;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::definitions::monitoring::testing::{empty_loader, loader_with, params};

    const FIXTURE: &str = r#"
apm_metrics:
  - service: payment-service
    operation: POST /api/v1/payments
    metrics:
      trace_duration_p50_ms: 120
      trace_duration_p95_ms: 650
      trace_duration_p99_ms: 1500
      error_rate_percent: 0.5
      request_rate_per_sec: 42.5
      success_count: 1990
      error_count: 10
  - service: legacy
    endpoint: /status
    avg_latency_ms: 30
    error_rate_percent: 7.2
    throughput_rps: 3
    request_count: 900
"#;

    fn find<'a>(result: &'a [Value], name: &str, quantile: Option<&str>) -> &'a Value {
        result
            .iter()
            .find(|s| {
                s["metric"]["__name__"] == name
                    && quantile.is_none_or(|q| s["metric"]["quantile"] == q)
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_series_per_endpoint() {
        let (_dir, loader) = loader_with(datasets::APM_DATA, FIXTURE);
        let tool = AppPerformanceTool::new(loader, ThresholdsConfig::default());
        let output = tool.invoke(&params(json!({"service": "payment-service"}))).await.unwrap();
        let doc = output.value();
        assert_eq!(doc["data"]["resultType"], "vector");

        let result = doc["data"]["result"].as_array().unwrap();
        assert_eq!(result.len(), 12);

        let first = &result[..6];
        let p50 = find(first, "app_request_latency_ms", Some("0.50"));
        assert_eq!(p50["metric"]["endpoint"], "POST /api/v1/payments");
        assert_eq!(p50["metric"]["status"], "ok");
        assert_eq!(p50["value"][1], "120");
        assert_eq!(find(first, "app_request_latency_ms", Some("0.95"))["metric"]["status"], "warning");
        assert_eq!(find(first, "app_request_latency_ms", Some("0.99"))["metric"]["status"], "critical");
        assert_eq!(find(first, "app_error_rate_percent", None)["metric"]["status"], "ok");
        assert_eq!(find(first, "app_throughput_rps", None)["value"][1], "42.5");
        assert_eq!(find(first, "app_request_count", None)["value"][1], "2000");

        let second = &result[6..];
        assert_eq!(find(second, "app_request_latency_ms", Some("0.50"))["metric"]["endpoint"], "/status");
        assert_eq!(find(second, "app_request_latency_ms", Some("0.95"))["value"][1], "0");
        assert_eq!(find(second, "app_error_rate_percent", None)["metric"]["status"], "critical");
        assert_eq!(find(second, "app_throughput_rps", None)["value"][1], "3");
        assert_eq!(find(second, "app_request_count", None)["value"][1], "900");
    }

    #[tokio::test]
    async fn test_negative_minutes() {
        let (_dir, loader) = empty_loader();
        let tool = AppPerformanceTool::new(loader, ThresholdsConfig::default());
        let err = tool.invoke(&params(json!({"minutes": -1}))).await.unwrap_err();
        assert!(matches!(err, ToolError::TimeRange(_)));
    }

    #[test]
    fn test_request_count_fallback() {
        assert_eq!(request_count(&json!({}), &json!({})), "0");
        assert_eq!(
            request_count(&json!({"success_count": 1.5, "error_count": 0.5}), &json!({})),
            "2.0"
        );
    }
}
