//! The uniform tool contract.
//!
//! Every tool exposes immutable metadata, an input schema, a synchronous
//! validation step and an async execution step. [`Tool::invoke`] chains the
//! two and is the only entry point the router and registry use.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{error, info};

use super::error::{ToolError, ToolResult};

/// Descriptive information about a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolMetadata {
    /// Registration name, unique within a server.
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    /// Whether the tool needs an API key. None of the bundled tools do.
    pub requires_credential: bool,
}

impl ToolMetadata {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            version: "1.0.0",
            requires_credential: false,
        }
    }
}

/// Successful tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A normalized mapping, returned as structured content.
    Structured(Value),
    /// A wire-format document, returned as pretty-printed JSON text.
    Document(Value),
}

impl ToolOutput {
    pub fn value(&self) -> &Value {
        match self {
            Self::Structured(v) | Self::Document(v) => v,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(v) | Self::Document(v) => v,
        }
    }

    /// Convert into an MCP tool result.
    pub fn into_call_result(self) -> CallToolResult {
        match self {
            Self::Structured(value) => {
                let mut result = CallToolResult::success(vec![Content::text(pretty(&value))]);
                result.structured_content = Some(value);
                result
            }
            Self::Document(value) => CallToolResult::success(vec![Content::text(pretty(&value))]),
        }
    }
}

/// Convert a tool error into an MCP error result.
pub fn error_result(err: &ToolError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.message())])
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Call arguments with typed accessors.
///
/// A JSON `null` is treated the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParams(Map<String, Value>);

impl ToolParams {
    pub fn new(args: Map<String, Value>) -> Self {
        Self(args)
    }

    /// Build from an arbitrary JSON value; only objects and `null` are accepted.
    pub fn from_value(value: Value) -> ToolResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(ToolError::validation(format!(
                "Arguments must be an object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Raw value for `key`, `None` if absent or null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// A string parameter that must be present.
    pub fn required_str(&self, key: &str) -> ToolResult<&str> {
        self.optional_str(key)?
            .ok_or_else(|| ToolError::validation(format!("{} parameter is required", key)))
    }

    pub fn optional_str(&self, key: &str) -> ToolResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ToolError::validation(format!("{} must be a string", key))),
        }
    }

    /// A string parameter with a default for the absent case.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> ToolResult<&'a str> {
        Ok(self.optional_str(key)?.unwrap_or(default))
    }

    pub fn optional_f64(&self, key: &str) -> ToolResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(_) => Err(ToolError::validation(format!("{} must be a number", key))),
        }
    }

    pub fn optional_i64(&self, key: &str) -> ToolResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| ToolError::validation(format!("{} must be an integer", key))),
        }
    }

    pub fn i64_or(&self, key: &str, default: i64) -> ToolResult<i64> {
        Ok(self.optional_i64(key)?.unwrap_or(default))
    }

    /// Deserialize into a typed parameter struct. Null values are dropped
    /// first so `#[serde(default)]` applies to them.
    pub fn deserialize<T: DeserializeOwned>(&self) -> ToolResult<T> {
        let map: Map<String, Value> = self
            .0
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(map))
            .map_err(|e| ToolError::validation(format!("Invalid arguments: {}", e)))
    }
}

impl From<Map<String, Value>> for ToolParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for ToolParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str("{}"),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> &ToolMetadata;

    /// JSON schema of the accepted arguments.
    fn input_schema(&self) -> Arc<JsonObject>;

    /// Check the arguments. Never performs I/O.
    fn validate(&self, params: &ToolParams) -> ToolResult<()>;

    /// Run the tool on already validated arguments.
    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput>;

    /// Validate, execute and log. A panic inside the tool becomes an
    /// `Execution` error carrying the panic message.
    async fn invoke(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let name = self.metadata().name;
        info!(tool = name, params = %params, "Executing tool");

        let run = async {
            self.validate(params)?;
            self.execute(params).await
        };
        let result = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ToolError::execution(format!(
                "Unexpected error in {}: {}",
                name,
                panic_message(panic.as_ref())
            ))),
        };

        match &result {
            Ok(_) => info!(tool = name, "Tool completed successfully"),
            Err(e) => error!(tool = name, kind = e.kind(), "Tool execution failed: {}", e),
        }
        result
    }

    /// MCP tool model advertised in `tools/list`.
    fn to_tool(&self) -> McpTool {
        let metadata = self.metadata();
        McpTool {
            name: metadata.name.into(),
            description: Some(metadata.description.into()),
            input_schema: self.input_schema(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
