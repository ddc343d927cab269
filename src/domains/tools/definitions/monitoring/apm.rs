//! APM traces (Jaeger) and service metrics (Prometheus).

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::formats::{
    float_value, get_or, is_truthy, iso_to_micros, jaeger_document, num, prometheus_vector, sample,
    sample_value, str_or, unix_now,
};
use super::{choice, string_filters, time_range};
use crate::domains::fixtures::{DataLoader, records};
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

const METRIC_TYPES: [&str; 4] = ["traces", "errors", "latency", "all"];

fn default_service() -> String {
    "all".to_string()
}

fn default_metric_type() -> String {
    "traces".to_string()
}

fn default_minutes() -> i64 {
    15
}

/// Parameters for the APM tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApmParams {
    #[schemars(description = "Service name or 'all'")]
    #[serde(default = "default_service")]
    pub service: String,

    #[schemars(description = "What to return: traces, errors, latency or all (default: traces)")]
    #[serde(default = "default_metric_type")]
    pub metric_type: String,

    #[schemars(description = "Time range in minutes (default: 15)")]
    #[serde(default = "default_minutes")]
    pub minutes: i64,

    #[schemars(description = "Error rate threshold in percent")]
    #[serde(default)]
    pub error_threshold: Option<f64>,
}

pub struct ApmTool {
    loader: Arc<DataLoader>,
}

impl ApmTool {
    pub const NAME: &'static str = "check_apm";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Query APM data: distributed traces in Jaeger format, or error and \
         latency metrics per service operation as Prometheus query results.",
    );

    pub fn new(loader: Arc<DataLoader>) -> Self {
        Self { loader }
    }

    fn trace(trace: &Value) -> Value {
        let trace_id = str_or(trace, "trace_id", "");
        let short_id: String = trace_id.chars().take(8).collect();
        let mut processes = Map::new();
        let mut spans = Vec::new();

        for span in trace.get("spans").and_then(Value::as_array).into_iter().flatten() {
            let service = str_or(span, "service_name", "unknown");
            let known = processes
                .values()
                .any(|p| p.get("serviceName").and_then(Value::as_str) == Some(service));
            if !known {
                let counter = processes.len() + 1;
                processes.insert(
                    format!("p{}", counter),
                    json!({
                        "serviceName": service,
                        "tags": {
                            "hostname": format!("{}-pod-{}", service.replace('-', "_"), short_id),
                            "ip": format!("10.0.1.{}", counter + 10),
                        },
                    }),
                );
            }

            let mut entry = json!({
                "traceID": trace_id,
                "spanID": get_or(span, "span_id", json!("")),
                "operationName": get_or(span, "operation_name", json!("")),
                "startTime": iso_to_micros(str_or(span, "start_time", "")),
                "duration": (num(span, "duration_ms") * 1000.0) as i64,
                "tags": get_or(span, "tags", json!({})),
                "logs": get_or(span, "logs", json!([])),
            });
            if let (Some(parent), Some(map)) = (
                span.get("parent_span_id").filter(|p| is_truthy(Some(p))),
                entry.as_object_mut(),
            ) {
                map.insert("parentSpanID".into(), parent.clone());
            }
            spans.push(entry);
        }

        json!({
            "traceID": trace_id,
            "spans": spans,
            "processes": processes,
        })
    }

    fn metric_series(record: &Value, metric_type: &str, ts: i64) -> Vec<Value> {
        let empty = json!({});
        let data = record.get("metrics").filter(|m| m.is_object()).unwrap_or(&empty);
        let service = get_or(record, "service", json!("unknown"));
        let operation = get_or(record, "operation", json!("unknown"));
        let labels = |name: &str| {
            json!({
                "__name__": name,
                "service": service,
                "operation": operation,
            })
        };

        let mut out = Vec::new();
        if matches!(metric_type, "errors" | "all") {
            for (name, key) in [
                ("apm_error_rate_percent", "error_rate_percent"),
                ("apm_error_count", "error_count"),
                ("apm_success_count", "success_count"),
            ] {
                out.push(sample(labels(name), ts, sample_value(data.get(key))));
            }
        }
        if matches!(metric_type, "latency" | "all") {
            for (quantile, key) in [
                ("0.50", "trace_duration_p50_ms"),
                ("0.95", "trace_duration_p95_ms"),
                ("0.99", "trace_duration_p99_ms"),
            ] {
                let mut metric = labels("apm_trace_duration_seconds");
                if let Some(map) = metric.as_object_mut() {
                    map.insert("quantile".into(), json!(quantile));
                }
                out.push(sample(metric, ts, float_value(num(data, key) / 1000.0)));
            }
            out.push(sample(
                labels("apm_request_rate"),
                ts,
                sample_value(data.get("request_rate_per_sec")),
            ));
        }
        out
    }

    async fn traces(&self) -> ToolResult<Value> {
        let data = self.loader.load_apm_traces().await?;
        let traces = records(&data, "traces").iter().map(Self::trace).collect();
        Ok(jaeger_document(traces))
    }

    async fn metrics(&self, metric_type: &str) -> ToolResult<Value> {
        let data = self.loader.load_apm_metrics().await?;
        let ts = unix_now();
        let result = records(&data, "apm_metrics")
            .iter()
            .flat_map(|record| Self::metric_series(record, metric_type, ts))
            .collect();
        Ok(prometheus_vector(result))
    }
}

#[async_trait]
impl Tool for ApmTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ApmParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["service"])?;
        params.optional_f64("error_threshold")?;
        time_range(params, "minutes", default_minutes(), "Minutes must be non-negative")?;
        choice(
            params,
            "metric_type",
            "traces",
            &METRIC_TYPES,
            "Invalid metric_type. Must be one of",
        )?;
        Ok(())
    }

    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let params: ApmParams = params.deserialize()?;
        let document = match params.metric_type.as_str() {
            "traces" => self.traces().await?,
            "all" => json!({
                "traces": self.traces().await?,
                "metrics": self.metrics("all").await?,
            }),
            other => self.metrics(other).await?,
        };
        Ok(ToolOutput::Document(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fixtures::datasets;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::definitions::monitoring::testing::{empty_loader, params, write};

    const TRACES: &str = r#"
traces:
  - trace_id: 4bf92f3577b34da6a3ce929d0e0e4736
    spans:
      - span_id: span-1
        service_name: api-gateway
        operation_name: GET /orders
        start_time: "2026-10-19T10:00:00Z"
        duration_ms: 250.5
      - span_id: span-2
        parent_span_id: span-1
        service_name: order-service
        operation_name: loadOrders
        start_time: "2026-10-19T10:00:00.010Z"
        duration_ms: 200
        tags:
          db.system: postgresql
      - span_id: span-3
        parent_span_id: ""
        service_name: api-gateway
        operation_name: serialize
"#;

    const METRICS: &str = r#"
apm_metrics:
  - service: order-service
    operation: loadOrders
    metrics:
      error_rate_percent: 1.2
      error_count: 12
      success_count: 988
      trace_duration_p50_ms: 120
      trace_duration_p95_ms: 480
      trace_duration_p99_ms: 1000
      request_rate_per_sec: 16.6
"#;

    fn tool() -> (tempfile::TempDir, ApmTool) {
        let (dir, loader) = empty_loader();
        write(dir.path(), datasets::APM_TRACES, TRACES);
        write(dir.path(), datasets::APM_METRICS, METRICS);
        (dir, ApmTool::new(loader))
    }

    #[tokio::test]
    async fn test_traces_as_jaeger() {
        let (_dir, tool) = tool();
        let output = tool.invoke(&params(json!({}))).await.unwrap();
        let trace = &output.value()["data"][0];
        assert_eq!(trace["traceID"], "4bf92f3577b34da6a3ce929d0e0e4736");

        let processes = trace["processes"].as_object().unwrap();
        assert_eq!(processes.len(), 2);
        assert_eq!(processes["p1"]["serviceName"], "api-gateway");
        assert_eq!(processes["p1"]["tags"]["hostname"], "api_gateway-pod-4bf92f35");
        assert_eq!(processes["p1"]["tags"]["ip"], "10.0.1.11");
        assert_eq!(processes["p2"]["tags"]["ip"], "10.0.1.12");

        let spans = trace["spans"].as_array().unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0]["startTime"], 1_792_404_000_000_000_i64);
        assert_eq!(spans[0]["duration"], 250_500);
        assert!(spans[0].get("parentSpanID").is_none());
        assert_eq!(spans[1]["parentSpanID"], "span-1");
        assert_eq!(spans[1]["startTime"], 1_792_404_000_010_000_i64);
        assert_eq!(spans[1]["tags"]["db.system"], "postgresql");
        assert!(spans[2].get("parentSpanID").is_none());
        assert_eq!(spans[2]["startTime"], 0);
        assert_eq!(spans[2]["logs"], json!([]));
    }

    #[tokio::test]
    async fn test_error_and_latency_metrics() {
        let (_dir, tool) = tool();

        let output = tool.invoke(&params(json!({"metric_type": "errors"}))).await.unwrap();
        let result = output.value()["data"]["result"].as_array().unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0]["metric"]["__name__"], "apm_error_rate_percent");
        assert_eq!(result[0]["value"][1], "1.2");
        assert_eq!(result[1]["value"][1], "12");

        let output = tool.invoke(&params(json!({"metric_type": "latency"}))).await.unwrap();
        let result = output.value()["data"]["result"].as_array().unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result[0]["metric"]["quantile"], "0.50");
        assert_eq!(result[0]["value"][1], "0.12");
        assert_eq!(result[2]["value"][1], "1.0");
        assert_eq!(result[3]["metric"]["__name__"], "apm_request_rate");
        assert_eq!(result[3]["value"][1], "16.6");
    }

    #[tokio::test]
    async fn test_all_combines_documents() {
        let (_dir, tool) = tool();
        let output = tool.invoke(&params(json!({"metric_type": "all"}))).await.unwrap();
        let doc = output.value();
        assert_eq!(doc["traces"]["data"].as_array().unwrap().len(), 1);
        assert_eq!(doc["metrics"]["data"]["result"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_validation() {
        let (_dir, tool) = tool();

        let err = tool.invoke(&params(json!({"metric_type": "spans"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Filter(_)));
        assert_eq!(
            err.message(),
            "Invalid metric_type. Must be one of: traces, errors, latency, all"
        );

        let err = tool.invoke(&params(json!({"minutes": -1}))).await.unwrap_err();
        assert!(matches!(err, ToolError::TimeRange(_)));

        let err = tool
            .invoke(&params(json!({"error_threshold": "high"})))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
