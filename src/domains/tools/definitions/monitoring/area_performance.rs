//! Business application areas (claims, billing, ...) as a Prometheus vector.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::formats::{get_or, num, prometheus_vector, sample, sample_value, unix_now};
use super::{string_filters, time_range};
use crate::domains::fixtures::DataLoader;
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

const DEFAULT_SLA_MS: i64 = 1000;

fn default_area() -> String {
    "all".to_string()
}

fn default_minutes() -> i64 {
    5
}

/// Parameters for the application area tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AreaPerformanceParams {
    #[schemars(description = "Application area name or 'all'")]
    #[serde(default = "default_area")]
    pub area: String,

    #[schemars(description = "Time range in minutes to query (default: 5)")]
    #[serde(default = "default_minutes")]
    pub time_range_minutes: i64,
}

pub struct AreaPerformanceTool {
    loader: Arc<DataLoader>,
}

impl AreaPerformanceTool {
    pub const NAME: &'static str = "application_performance_inquiry";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Query performance of business application areas: request rate, \
         response time quantiles, error and success counts, throughput and \
         SLA compliance, as Prometheus query results.",
    );

    pub fn new(loader: Arc<DataLoader>) -> Self {
        Self { loader }
    }

    /// Flatten `application_areas` into one record per metric, with the
    /// area fields underneath the metric's own keys.
    fn flatten(areas: &Map<String, Value>) -> Vec<Value> {
        let mut out = Vec::new();
        for (name, area) in areas {
            let metrics = area.get("metrics").and_then(Value::as_array);
            for metric in metrics.into_iter().flatten() {
                let mut merged = Map::new();
                merged.insert("area".into(), json!(name));
                merged.insert("description".into(), get_or(area, "description", json!("")));
                merged.insert("criticality".into(), get_or(area, "criticality", json!("NORMAL")));
                merged.insert(
                    "sla_response_time_ms".into(),
                    get_or(area, "sla_response_time_ms", json!(DEFAULT_SLA_MS)),
                );
                if let Some(fields) = metric.as_object() {
                    merged.extend(fields.clone());
                }
                out.push(Value::Object(merged));
            }
        }
        out
    }

    fn series(metric: &Value, ts: i64) -> Vec<Value> {
        let area = get_or(metric, "area", json!("unknown"));
        let criticality = get_or(metric, "criticality", json!("NORMAL"));
        let sla = get_or(metric, "sla_response_time_ms", json!(DEFAULT_SLA_MS));

        let labels = |name: &str, extra: Option<(&str, String)>| {
            let mut labels = json!({
                "__name__": name,
                "area": area,
                "criticality": criticality,
            });
            if let (Some((key, value)), Some(map)) = (extra, labels.as_object_mut()) {
                map.insert(key.to_string(), json!(value));
            }
            labels
        };
        let value = |key: &str| sample_value(metric.get(key));
        let quantile = |q: &str| Some(("quantile", q.to_string()));

        let sla_ms = sla.as_f64().unwrap_or(DEFAULT_SLA_MS as f64);
        let compliant = if num(metric, "response_time_p95_ms") <= sla_ms { "1" } else { "0" };

        vec![
            sample(labels("appl_area_request_rate", None), ts, value("request_rate")),
            sample(
                labels("appl_area_response_time_ms", quantile("0.50")),
                ts,
                value("response_time_p50_ms"),
            ),
            sample(
                labels("appl_area_response_time_ms", quantile("0.95")),
                ts,
                value("response_time_p95_ms"),
            ),
            sample(
                labels("appl_area_response_time_ms", quantile("0.99")),
                ts,
                value("response_time_p99_ms"),
            ),
            sample(labels("appl_area_error_count", None), ts, value("error_count")),
            sample(labels("appl_area_success_count", None), ts, value("success_count")),
            sample(labels("appl_area_throughput_rps", None), ts, value("throughput_rps")),
            sample(
                labels("appl_area_sla_compliant", Some(("sla_ms", sample_value(Some(&sla))))),
                ts,
                compliant,
            ),
        ]
    }
}

#[async_trait]
impl Tool for AreaPerformanceTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<AreaPerformanceParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["area"])?;
        time_range(
            params,
            "time_range_minutes",
            default_minutes(),
            "Time range must be non-negative",
        )?;
        Ok(())
    }

    async fn execute(&self, _params: &ToolParams) -> ToolResult<ToolOutput> {
        let data = self.loader.load_appl_area_metrics().await?;
        let empty = Map::new();
        let areas = data
            .get("application_areas")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let ts = unix_now();
        let result = Self::flatten(areas)
            .iter()
            .flat_map(|metric| Self::series(metric, ts))
            .collect();
        Ok(ToolOutput::Document(prometheus_vector(result)))
    }
}
