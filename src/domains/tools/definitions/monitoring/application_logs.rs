//! Application logs, shaped as an Elasticsearch search response.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::formats::{daily_index, es_hit, es_response, get_or, hash_bucket, is_truthy, random_hex};
use super::{choice, string_filters, time_range};
use crate::domains::fixtures::{DataLoader, records};
use crate::domains::tools::ToolResult;
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};

const LEVELS: [&str; 4] = ["DEBUG", "INFO", "WARN", "ERROR"];
const INDEX_PREFIX: &str = "app-logs";

fn default_service() -> String {
    "all".to_string()
}

fn default_minutes() -> i64 {
    30
}

fn default_level() -> String {
    "ERROR".to_string()
}

/// Parameters for the application log tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApplicationLogsParams {
    #[schemars(description = "Service name or 'all'")]
    #[serde(default = "default_service")]
    pub service: String,

    #[schemars(description = "Look back N minutes (default: 30)")]
    #[serde(default = "default_minutes")]
    pub minutes: i64,

    #[schemars(description = "Log level: DEBUG, INFO, WARN or ERROR (default: ERROR)")]
    #[serde(default = "default_level")]
    pub level: String,

    #[schemars(description = "Pattern to search for in log messages")]
    #[serde(default)]
    pub search_pattern: Option<String>,
}

pub struct ApplicationLogsTool {
    loader: Arc<DataLoader>,
}

impl ApplicationLogsTool {
    pub const NAME: &'static str = "check_application_logs";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Retrieve application logs for errors and exceptions. Returns an \
         Elasticsearch search response over the daily app-logs index.",
    );

    pub fn new(loader: Arc<DataLoader>) -> Self {
        Self { loader }
    }

    fn source(log: &Value) -> Map<String, Value> {
        let service = text(log.get("service")).unwrap_or_else(|| "unknown".to_string());
        let message = text(log.get("message"));
        let default_trace = format!(
            "java.lang.Exception: {}\n\
             \tat com.company.service.Handler.process(Handler.java:123)\n\
             \tat com.company.service.Controller.handle(Controller.java:45)",
            message.as_deref().unwrap_or("Unknown error")
        );
        let thread = format!(
            "http-nio-8080-exec-{}",
            hash_bucket(message.as_deref().unwrap_or(""), 50)
        );

        let mut source = Map::new();
        let mut put = |key: &str, value: Value| {
            source.insert(key.to_string(), value);
        };
        put(
            "@timestamp",
            get_or(log, "timestamp", json!(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false))),
        );
        put("level", get_or(log, "level", json!("INFO")));
        put(
            "logger_name",
            get_or(log, "logger", json!(format!("com.company.{}.Service", service))),
        );
        put("message", get_or(log, "message", json!("")));
        put("thread_name", get_or(log, "thread", json!(thread)));
        put("service", get_or(log, "service", json!("unknown")));
        put(
            "instance",
            get_or(log, "instance", json!(format!("{}-{}", service, random_hex(8)))),
        );
        put("namespace", get_or(log, "namespace", json!("production")));
        put("version", get_or(log, "version", json!("unknown")));
        put("trace_id", get_or(log, "trace_id", json!(random_hex(32))));
        put("span_id", get_or(log, "span_id", json!(random_hex(16))));
        put("parent_span_id", get_or(log, "parent_span_id", Value::Null));
        put("request_id", get_or(log, "request_id", Value::Null));

        if log.get("level").and_then(Value::as_str) == Some("ERROR") {
            match log.get("exception").filter(|e| is_truthy(Some(e))) {
                Some(exception) => {
                    let fallback_message = get_or(log, "message", json!("Unknown error"));
                    put("exception_class", get_or(exception, "class", json!("java.lang.Exception")));
                    put("exception_message", get_or(exception, "message", fallback_message));
                    put("stack_trace", get_or(exception, "stacktrace", json!(default_trace)));
                }
                None => put("stack_trace", json!(default_trace)),
            }
        }

        if let Some(context) = log.get("context").filter(|c| is_truthy(Some(c))) {
            put("context", context.clone());
            for key in ["transaction_id", "customer_id"] {
                if let Some(value) = context.get(key).filter(|v| is_truthy(Some(v))) {
                    put(key, value.clone());
                }
            }
        }

        if let Some(user) = log.get("user_id").filter(|v| is_truthy(Some(v))) {
            put("user_id", user.clone());
        }

        source
    }
}

/// Text form of a scalar fixture value, `None` when absent.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some("None".to_string()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl Tool for ApplicationLogsTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ApplicationLogsParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        string_filters(params, &["service", "search_pattern"])?;
        time_range(params, "minutes", default_minutes(), "Minutes must be non-negative")?;
        choice(params, "level", "ERROR", &LEVELS, "Level must be one of")?;
        Ok(())
    }

    async fn execute(&self, _params: &ToolParams) -> ToolResult<ToolOutput> {
        let data = self.loader.load_application_logs().await?;
        let index = daily_index(INDEX_PREFIX, Utc::now());
        let hits = records(&data, "application_logs")
            .iter()
            .map(|log| es_hit(&index, Self::source(log)))
            .collect();
        Ok(ToolOutput::Document(es_response(hits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::fixtures::datasets;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::definitions::monitoring::testing::{empty_loader, loader_with, params};

    const FIXTURE: &str = r#"
application_logs:
  - timestamp: "2026-10-19T10:15:00Z"
    level: ERROR
    service: payment-service
    message: Payment gateway timeout
    trace_id: abc123
    exception:
      class: java.net.SocketTimeoutException
    context:
      transaction_id: TX-1
      customer_id: ""
    user_id: U-9
  - level: ERROR
    service: order-service
    message: Null order
  - level: INFO
    message: Started
"#;

    #[tokio::test]
    async fn test_hits_per_record() {
        let (_dir, loader) = loader_with(datasets::APPLICATION_LOGS, FIXTURE);
        let tool = ApplicationLogsTool::new(loader);
        let output = tool.invoke(&params(json!({"level": "WARN"}))).await.unwrap();
        let doc = output.value();

        assert_eq!(doc["hits"]["total"]["value"], 3);
        let hits = doc["hits"]["hits"].as_array().unwrap();
        let index = daily_index(INDEX_PREFIX, Utc::now());
        assert_eq!(hits[0]["_index"], index.as_str());
        assert_eq!(hits[0]["_id"].as_str().unwrap().len(), 12);

        let first = &hits[0]["_source"];
        assert_eq!(first["@timestamp"], "2026-10-19T10:15:00Z");
        assert_eq!(first["logger_name"], "com.company.payment-service.Service");
        assert_eq!(first["trace_id"], "abc123");
        assert_eq!(first["exception_class"], "java.net.SocketTimeoutException");
        assert_eq!(first["exception_message"], "Payment gateway timeout");
        assert!(first["stack_trace"].as_str().unwrap().starts_with("java.lang.Exception: Payment gateway timeout"));
        assert_eq!(first["transaction_id"], "TX-1");
        assert!(first.get("customer_id").is_none());
        assert_eq!(first["user_id"], "U-9");
        assert!(first["parent_span_id"].is_null());

        let second = &hits[1]["_source"];
        assert!(second.get("exception_class").is_none());
        assert!(second["stack_trace"].as_str().unwrap().contains("Handler.java:123"));
        assert!(second["instance"].as_str().unwrap().starts_with("order-service-"));
        assert_eq!(second["span_id"].as_str().unwrap().len(), 16);
        assert!(second["thread_name"].as_str().unwrap().starts_with("http-nio-8080-exec-"));

        let third = &hits[2]["_source"];
        assert!(third.get("stack_trace").is_none());
        assert_eq!(third["service"], "unknown");
        assert_eq!(third["namespace"], "production");
    }

    #[tokio::test]
    async fn test_repeat_call_reuses_cached_fixture() {
        const COMPLETE: &str = r#"
application_logs:
  - timestamp: "2026-10-19T10:15:00Z"
    level: ERROR
    service: payment-service
    message: Payment gateway timeout
    instance: payment-service-7c9f
    trace_id: 4bf92f3577b34da6a3ce929d0e0e4736
    span_id: 00f067aa0ba902b7
"#;
        let (_dir, loader) = loader_with(datasets::APPLICATION_LOGS, COMPLETE);
        let tool = ApplicationLogsTool::new(loader.clone());

        let mut first = tool.invoke(&params(json!({}))).await.unwrap().value().clone();
        let mut second = tool.invoke(&params(json!({}))).await.unwrap().value().clone();

        let stats = loader.cache_stats().await;
        assert_eq!(stats.cached_items, 1);
        assert_eq!(stats.cache_keys, [datasets::APPLICATION_LOGS]);

        // Hit ids are random per call
        for doc in [&mut first, &mut second] {
            for hit in doc["hits"]["hits"].as_array_mut().unwrap() {
                assert_eq!(hit["_id"].as_str().unwrap().len(), 12);
                hit["_id"] = Value::Null;
            }
        }
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_level_and_minutes_validation() {
        let (_dir, loader) = empty_loader();
        let tool = ApplicationLogsTool::new(loader);

        let err = tool.invoke(&params(json!({"level": "FATAL"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Filter(_)));
        assert_eq!(err.message(), "Level must be one of: DEBUG, INFO, WARN, ERROR");

        let err = tool.invoke(&params(json!({"minutes": -1}))).await.unwrap_err();
        assert!(matches!(err, ToolError::TimeRange(_)));
    }

    #[test]
    fn test_text() {
        assert_eq!(text(None), None);
        assert_eq!(text(Some(&json!("a"))).as_deref(), Some("a"));
        assert_eq!(text(Some(&json!(3))).as_deref(), Some("3"));
    }
}
