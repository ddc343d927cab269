//! Tools backed by public, key-less HTTP APIs.
//!
//! Each tool binds one upstream base URL and reshapes the upstream JSON into
//! a normalized mapping. Missing upstream fields become empty strings.

mod dictionary;
mod exchange_rate;
mod ip_info;
mod weather;

pub use dictionary::{DictionaryParams, DictionaryTool};
pub use exchange_rate::{ExchangeRateParams, ExchangeRateTool};
pub use ip_info::{IpInfoParams, IpInfoTool, is_valid_ip};
pub use weather::{WeatherParams, WeatherTool};

use serde_json::{Value, json};

/// `obj[key]` as-is, or `""` when absent or null.
fn field_or_empty(obj: &Value, key: &str) -> Value {
    match obj.get(key) {
        Some(v) if !v.is_null() => v.clone(),
        _ => json!(""),
    }
}

/// `obj[key]` as-is, or `[]` when absent.
fn list_or_empty(obj: &Value, key: &str) -> Value {
    match obj.get(key) {
        Some(v) if !v.is_null() => v.clone(),
        _ => json!([]),
    }
}

/// First element of the array under `key`, or `Null`.
fn first<'a>(obj: &'a Value, key: &str) -> &'a Value {
    obj.get(key)
        .and_then(|v| v.get(0))
        .unwrap_or(&Value::Null)
}

/// The `value` of the first entry under `key`, as used by wttr.in for
/// localized strings: `"areaName": [{"value": "London"}]`.
fn first_value(obj: &Value, key: &str) -> Option<Value> {
    first(obj, key).get("value").filter(|v| !v.is_null()).cloned()
}
