//! Builders for the wire formats the monitoring tools emit.
//!
//! - Prometheus instant query: `{status, data: {resultType: "vector", result}}`
//! - Elasticsearch search response with `hits.hits[]._source`
//! - SQL result envelope: `{query, rowCount, rows}`
//! - Jaeger trace document: `{data: [{traceID, spans, processes}]}`

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

// ============================================================================
// Record access
// ============================================================================

/// `record[key]` when the key exists (even if null), otherwise `default`.
pub fn get_or(record: &Value, key: &str, default: Value) -> Value {
    record.get(key).cloned().unwrap_or(default)
}

/// `record[key]` as a string, or `default` when absent or not a string.
pub fn str_or<'a>(record: &'a Value, key: &str, default: &'a str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// `record[key]` as a number, or `0.0`.
pub fn num(record: &Value, key: &str) -> f64 {
    record.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// True for values that count as "present": non-null, non-empty, non-zero.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

// ============================================================================
// Prometheus
// ============================================================================

/// Current Unix time in seconds, as used in Prometheus sample values.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Render a sample value the way Prometheus does: always a string.
///
/// Integers keep their integer form and floats keep a decimal point, so a
/// fixture `45.0` renders as `"45.0"` and `45` as `"45"`. A missing value
/// renders as `"0"`; an explicit null as `"None"` and booleans as
/// `"True"`/`"False"`, matching the exporters these fixtures came from.
pub fn sample_value(value: Option<&Value>) -> String {
    match value {
        None => "0".to_string(),
        Some(Value::Null) => "None".to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render a computed float as a sample value.
pub fn float_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// One vector sample: `{metric: {...labels}, value: [timestamp, "value"]}`.
pub fn sample(metric: Value, timestamp: i64, value: impl Into<String>) -> Value {
    json!({
        "metric": metric,
        "value": [timestamp, value.into()],
    })
}

/// `ok`, `warning` or `critical` for a value against a threshold pair.
pub fn threshold_status(value: f64, warning: f64, critical: f64) -> &'static str {
    if value > critical {
        "critical"
    } else if value > warning {
        "warning"
    } else {
        "ok"
    }
}

/// Wrap samples in a successful instant-vector query response.
pub fn prometheus_vector(result: Vec<Value>) -> Value {
    json!({
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": result,
        },
    })
}

// ============================================================================
// Elasticsearch
// ============================================================================

/// Daily index name, e.g. `app-logs-2026.10.19`.
pub fn daily_index(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, now.format("%Y.%m.%d"))
}

/// One search hit with a null score.
pub fn es_hit(index: &str, source: Map<String, Value>) -> Value {
    json!({
        "_index": index,
        "_id": random_hex(12),
        "_score": null,
        "_source": source,
    })
}

/// A complete search response around `hits`.
pub fn es_response(hits: Vec<Value>) -> Value {
    json!({
        "took": 5,
        "timed_out": false,
        "_shards": {
            "total": 5,
            "successful": 5,
            "skipped": 0,
            "failed": 0,
        },
        "hits": {
            "total": {
                "value": hits.len(),
                "relation": "eq",
            },
            "max_score": null,
            "hits": hits,
        },
    })
}

// ============================================================================
// SQL
// ============================================================================

/// A query result set as returned by a database client.
pub fn sql_envelope(query: &str, rows: Vec<Value>) -> Value {
    json!({
        "query": query,
        "rowCount": rows.len(),
        "rows": rows,
    })
}

// ============================================================================
// Jaeger
// ============================================================================

/// Wrap traces in a Jaeger query API document.
pub fn jaeger_document(traces: Vec<Value>) -> Value {
    json!({ "data": traces })
}

/// Microseconds since the epoch for an ISO 8601 timestamp, `0` if it does
/// not parse. Timestamps without an offset are read as UTC.
pub fn iso_to_micros(timestamp: &str) -> i64 {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.timestamp_micros();
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().timestamp_micros())
        .unwrap_or(0)
}

// ============================================================================
// Identifiers
// ============================================================================

/// `len` lowercase hex characters from a fresh v4 UUID (at most 32).
pub fn random_hex(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len.min(32));
    id
}

/// Stable bucket in `0..buckets` for a piece of text.
pub fn hash_bucket(text: &str, buckets: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish() % buckets.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_value_rendering() {
        assert_eq!(sample_value(Some(&json!(45.2))), "45.2");
        assert_eq!(sample_value(Some(&json!(45))), "45");
        assert_eq!(sample_value(Some(&json!(45.0))), "45.0");
        assert_eq!(sample_value(Some(&json!("7"))), "7");
        assert_eq!(sample_value(None), "0");
        assert_eq!(sample_value(Some(&Value::Null)), "None");
        assert_eq!(sample_value(Some(&json!(true))), "True");
        assert_eq!(sample_value(Some(&json!(false))), "False");
        assert_eq!(float_value(0.12), "0.12");
        assert_eq!(float_value(2.0), "2.0");
    }

    #[test]
    fn test_threshold_status() {
        assert_eq!(threshold_status(50.0, 70.0, 85.0), "ok");
        assert_eq!(threshold_status(70.0, 70.0, 85.0), "ok");
        assert_eq!(threshold_status(80.0, 70.0, 85.0), "warning");
        assert_eq!(threshold_status(90.0, 70.0, 85.0), "critical");
    }

    #[test]
    fn test_prometheus_shape() {
        let vector = prometheus_vector(vec![sample(
            json!({"__name__": "up", "job": "node"}),
            1_700_000_000,
            "1",
        )]);
        assert_eq!(vector["status"], "success");
        assert_eq!(vector["data"]["resultType"], "vector");
        assert_eq!(vector["data"]["result"][0]["metric"]["__name__"], "up");
        assert_eq!(vector["data"]["result"][0]["value"], json!([1_700_000_000, "1"]));
    }

    #[test]
    fn test_es_shape() {
        let mut source = Map::new();
        source.insert("message".into(), json!("boom"));
        let response = es_response(vec![es_hit("app-logs-2026.10.19", source)]);
        assert_eq!(response["hits"]["total"], json!({"value": 1, "relation": "eq"}));
        assert!(response["hits"]["max_score"].is_null());
        let hit = &response["hits"]["hits"][0];
        assert_eq!(hit["_id"].as_str().unwrap().len(), 12);
        assert!(hit["_score"].is_null());
        assert_eq!(hit["_source"]["message"], "boom");
    }

    #[test]
    fn test_daily_index() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        assert_eq!(daily_index("app-logs", now), "app-logs-2026.01.05");
    }

    #[test]
    fn test_sql_envelope() {
        let envelope = sql_envelope("SELECT 1", vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(envelope["rowCount"], 2);
        assert_eq!(envelope["query"], "SELECT 1");
    }

    #[test]
    fn test_iso_to_micros() {
        assert_eq!(iso_to_micros("1970-01-01T00:00:01Z"), 1_000_000);
        assert_eq!(iso_to_micros("1970-01-01T00:00:01.5+00:00"), 1_500_000);
        assert_eq!(iso_to_micros("1970-01-01T00:00:02"), 2_000_000);
        assert_eq!(iso_to_micros("yesterday"), 0);
    }

    #[test]
    fn test_record_access() {
        let record = json!({"a": null, "n": 3, "s": "x", "empty": ""});
        assert_eq!(get_or(&record, "a", json!("d")), Value::Null);
        assert_eq!(get_or(&record, "missing", json!("d")), json!("d"));
        assert_eq!(str_or(&record, "s", "d"), "x");
        assert_eq!(num(&record, "n"), 3.0);
        assert!(!is_truthy(record.get("empty")));
        assert!(is_truthy(record.get("s")));
        assert!(!is_truthy(record.get("missing")));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(random_hex(8).len(), 8);
        assert_eq!(random_hex(64).len(), 32);
        assert!(hash_bucket("message", 50) < 50);
        assert_eq!(hash_bucket("same", 50), hash_bucket("same", 50));
    }
}
