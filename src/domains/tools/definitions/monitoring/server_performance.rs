//! Node metrics, shaped as Prometheus query responses per metric family.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::formats::{get_or, num, prometheus_vector, sample, sample_value, str_or, threshold_status, unix_now};
use super::{choice, string_filters, time_range};
use crate::core::config::ThresholdsConfig;
use crate::domains::fixtures::{DataLoader, records};
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

const METRIC_TYPES: [&str; 5] = ["cpu", "memory", "disk_io", "network", "all"];

const CPU_QUERY: &str =
    r#"100 - (avg by (instance) (irate(node_cpu_seconds_total{mode="idle"}[5m])) * 100)"#;
const MEMORY_QUERY: &str =
    "100 * (1 - ((node_memory_MemAvailable_bytes) / (node_memory_MemTotal_bytes)))";
const DISK_QUERY: &str = "rate(node_disk_read_bytes_total[5m]) / 1024 / 1024";
const NETWORK_QUERY: &str = "rate(node_network_receive_bytes_total[5m]) / 1024 / 1024";

fn default_node() -> String {
    "all".to_string()
}

fn default_metric_type() -> String {
    "all".to_string()
}

fn default_minutes() -> i64 {
    5
}

/// Parameters for the server performance tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServerPerformanceParams {
    #[schemars(description = "Node name or 'all'")]
    #[serde(default = "default_node")]
    pub node: String,

    #[schemars(description = "Metric family: cpu, memory, disk_io, network or all (default: all)")]
    #[serde(default = "default_metric_type")]
    pub metric_type: String,

    #[schemars(description = "Time range in minutes (default: 5)")]
    #[serde(default = "default_minutes")]
    pub minutes: i64,
}

pub struct ServerPerformanceTool {
    loader: Arc<DataLoader>,
    thresholds: ThresholdsConfig,
}

impl ServerPerformanceTool {
    pub const NAME: &'static str = "view_server_performance";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "View server resource usage (CPU, memory, disk I/O, network) as \
         Prometheus query results.",
    );

    pub fn new(loader: Arc<DataLoader>, thresholds: ThresholdsConfig) -> Self {
        Self { loader, thresholds }
    }

    fn instance(node: &Value) -> String {
        format!("{}:9100", str_or(node, "node", "unknown"))
    }

    fn cpu(&self, nodes: &[Value], ts: i64) -> Vec<Value> {
        nodes
            .iter()
            .map(|m| {
                let status = threshold_status(
                    num(m, "cpu_usage_percent"),
                    self.thresholds.cpu_warning,
                    self.thresholds.cpu_critical,
                );
                sample(
                    json!({
                        "__name__": "node_cpu_usage_percent",
                        "instance": Self::instance(m),
                        "job": "node-exporter",
                        "zone": get_or(m, "zone", json!("us-east-1a")),
                        "status": status,
                    }),
                    ts,
                    sample_value(m.get("cpu_usage_percent")),
                )
            })
            .collect()
    }

    fn memory(&self, nodes: &[Value], ts: i64) -> Vec<Value> {
        nodes
            .iter()
            .map(|m| {
                let status = threshold_status(
                    num(m, "memory_usage_percent"),
                    self.thresholds.memory_warning,
                    self.thresholds.memory_critical,
                );
                sample(
                    json!({
                        "__name__": "node_memory_usage_percent",
                        "instance": Self::instance(m),
                        "job": "node-exporter",
                        "status": status,
                    }),
                    ts,
                    sample_value(m.get("memory_usage_percent")),
                )
            })
            .collect()
    }

    fn device_series(name: &str, device: &str, key: &str, node: &Value, ts: i64) -> Value {
        sample(
            json!({
                "__name__": name,
                "instance": Self::instance(node),
                "device": device,
            }),
            ts,
            sample_value(node.get(key)),
        )
    }

    fn disk_io(nodes: &[Value], ts: i64) -> Vec<Value> {
        let reads = nodes
            .iter()
            .map(|m| Self::device_series("node_disk_read_mbps", "sda", "disk_io_read_mbps", m, ts));
        let writes = nodes
            .iter()
            .map(|m| Self::device_series("node_disk_write_mbps", "sda", "disk_io_write_mbps", m, ts));
        reads.chain(writes).collect()
    }

    fn network(nodes: &[Value], ts: i64) -> Vec<Value> {
        nodes
            .iter()
            .flat_map(|m| {
                [
                    Self::device_series("node_network_receive_mbps", "eth0", "network_rx_mbps", m, ts),
                    Self::device_series("node_network_transmit_mbps", "eth0", "network_tx_mbps", m, ts),
                ]
            })
            .collect()
    }
}

fn family(query: &str, result: Vec<Value>) -> Value {
    json!({
        "query": query,
        "response": prometheus_vector(result),
    })
}

#[async_trait]
impl Tool for ServerPerformanceTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ServerPerformanceParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["node"])?;
        time_range(params, "minutes", default_minutes(), "Minutes must be non-negative")?;
        choice(params, "metric_type", "all", &METRIC_TYPES, "Metric type must be one of")?;
        Ok(())
    }

    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let params: ServerPerformanceParams = params.deserialize()?;
        let data = self.loader.load_server_metrics().await?;
        let nodes = records(&data, "server_metrics");
        let ts = unix_now();
        let wants = |family: &str| params.metric_type == family || params.metric_type == "all";

        let mut metrics = Map::new();
        if wants("cpu") {
            metrics.insert("cpu_usage".into(), family(CPU_QUERY, self.cpu(nodes, ts)));
        }
        if wants("memory") {
            metrics.insert("memory_usage".into(), family(MEMORY_QUERY, self.memory(nodes, ts)));
        }
        if wants("disk_io") {
            metrics.insert("disk_io".into(), family(DISK_QUERY, Self::disk_io(nodes, ts)));
        }
        if wants("network") {
            metrics.insert("network".into(), family(NETWORK_QUERY, Self::network(nodes, ts)));
        }

        Ok(ToolOutput::Document(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "source": "prometheus",
            "metrics": metrics,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fixtures::datasets;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::definitions::monitoring::testing::{empty_loader, loader_with, params};

    const FIXTURE: &str = r#"
server_metrics:
  - node: web-01
    zone: eu-west-1b
    cpu_usage_percent: 45.0
    memory_usage_percent: 82.5
    disk_io_read_mbps: 12.3
    disk_io_write_mbps: 4
    network_rx_mbps: 100.5
    network_tx_mbps: 80.1
  - node: db-01
    cpu_usage_percent: 91.2
"#;

    fn tool() -> (tempfile::TempDir, ServerPerformanceTool) {
        let (dir, loader) = loader_with(datasets::SERVER_METRICS, FIXTURE);
        (dir, ServerPerformanceTool::new(loader, ThresholdsConfig::default()))
    }

    #[tokio::test]
    async fn test_all_families() {
        let (_dir, tool) = tool();
        let output = tool.invoke(&params(json!({}))).await.unwrap();
        let doc = output.value();
        assert_eq!(doc["source"], "prometheus");

        let metrics = doc["metrics"].as_object().unwrap();
        let keys: Vec<&String> = metrics.keys().collect();
        assert_eq!(keys, ["cpu_usage", "memory_usage", "disk_io", "network"]);

        let cpu = &metrics["cpu_usage"];
        assert_eq!(cpu["query"], CPU_QUERY);
        let cpu_result = cpu["response"]["data"]["result"].as_array().unwrap();
        assert_eq!(cpu_result.len(), 2);
        assert_eq!(cpu_result[0]["metric"]["instance"], "web-01:9100");
        assert_eq!(cpu_result[0]["metric"]["zone"], "eu-west-1b");
        assert_eq!(cpu_result[0]["metric"]["status"], "ok");
        assert_eq!(cpu_result[0]["value"][1], "45.0");
        assert_eq!(cpu_result[1]["metric"]["zone"], "us-east-1a");
        assert_eq!(cpu_result[1]["metric"]["status"], "critical");

        let memory = metrics["memory_usage"]["response"]["data"]["result"].as_array().unwrap();
        assert_eq!(memory[0]["metric"]["status"], "warning");
        assert_eq!(memory[1]["value"][1], "0");

        let disk = metrics["disk_io"]["response"]["data"]["result"].as_array().unwrap();
        let names: Vec<&str> = disk.iter().map(|s| s["metric"]["__name__"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            ["node_disk_read_mbps", "node_disk_read_mbps", "node_disk_write_mbps", "node_disk_write_mbps"]
        );
        assert_eq!(disk[2]["value"][1], "4");

        let network = metrics["network"]["response"]["data"]["result"].as_array().unwrap();
        assert_eq!(network.len(), 4);
        assert_eq!(network[0]["metric"]["__name__"], "node_network_receive_mbps");
        assert_eq!(network[1]["metric"]["__name__"], "node_network_transmit_mbps");
        assert_eq!(network[1]["metric"]["device"], "eth0");
    }

    #[tokio::test]
    async fn test_repeat_call_reuses_cached_fixture() {
        let (_dir, loader) = loader_with(datasets::SERVER_METRICS, FIXTURE);
        let tool = ServerPerformanceTool::new(loader.clone(), ThresholdsConfig::default());

        let mut first = tool.invoke(&params(json!({}))).await.unwrap().value().clone();
        let mut second = tool.invoke(&params(json!({}))).await.unwrap().value().clone();

        let stats = loader.cache_stats().await;
        assert_eq!(stats.cached_items, 1);
        assert_eq!(stats.cache_keys, [datasets::SERVER_METRICS]);

        // Only the clock may differ between calls
        for doc in [&mut first, &mut second] {
            doc["timestamp"] = Value::Null;
            for family in doc["metrics"].as_object_mut().unwrap().values_mut() {
                for series in family["response"]["data"]["result"].as_array_mut().unwrap() {
                    series["value"][0] = Value::Null;
                }
            }
        }
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_single_family() {
        let (_dir, tool) = tool();
        let output = tool.invoke(&params(json!({"metric_type": "memory"}))).await.unwrap();
        let metrics = output.value()["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("memory_usage"));
    }

    #[tokio::test]
    async fn test_validation() {
        let (_dir, loader) = empty_loader();
        let tool = ServerPerformanceTool::new(loader, ThresholdsConfig::default());

        let err = tool.invoke(&params(json!({"metric_type": "gpu"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Filter(_)));
        assert_eq!(
            err.message(),
            "Metric type must be one of: cpu, memory, disk_io, network, all"
        );

        let err = tool.invoke(&params(json!({"minutes": -10}))).await.unwrap_err();
        assert!(matches!(err, ToolError::TimeRange(_)));
    }
}
