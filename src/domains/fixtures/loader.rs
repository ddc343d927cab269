//! YAML fixture loader with a process-wide memo cache.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domains::tools::{ToolError, ToolResult};

/// Logical paths of the bundled datasets, relative to the data directory.
pub mod datasets {
    pub const INTERFACE_LOGS: &str = "logs/interface_logs.yaml";
    pub const BATCH_LOGS: &str = "logs/batch_logs.yaml";
    pub const APPLICATION_LOGS: &str = "logs/application_logs.yaml";
    pub const SERVER_METRICS: &str = "performance/server_metrics.yaml";
    pub const APM_DATA: &str = "performance/apm_data.yaml";
    pub const APPL_AREA_METRICS: &str = "performance/appl_area_metrics.yaml";
    pub const APM_TRACES: &str = "apm/traces.yaml";
    pub const APM_METRICS: &str = "apm/metrics.yaml";
    pub const HEALTH_CHECKS: &str = "health_checks/api_endpoints.yaml";
}

/// Snapshot of the cache content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cached_items: usize,
    /// Cached logical paths, sorted.
    pub cache_keys: Vec<String>,
}

/// Loads YAML fixtures relative to a base directory.
///
/// Parsed documents are cached until [`DataLoader::clear_cache`]. Two
/// concurrent first loads of the same file may both read it; the last one
/// wins and both callers get a complete document.
#[derive(Debug)]
pub struct DataLoader {
    base_path: PathBuf,
    cache: RwLock<HashMap<String, Arc<Value>>>,
}

impl DataLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load and parse a YAML file. Empty documents load as an empty mapping.
    pub async fn load_yaml(&self, path: &str, use_cache: bool) -> ToolResult<Arc<Value>> {
        if use_cache {
            if let Some(cached) = self.cache.read().await.get(path) {
                debug!("Using cached data for {}", path);
                return Ok(Arc::clone(cached));
            }
        }

        let full_path = self.resolve(path)?;
        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::data_load(format!(
                    "File not found: {}",
                    full_path.display()
                )));
            }
            Err(e) => {
                return Err(ToolError::data_load(format!(
                    "Failed to read file {}: {}",
                    path, e
                )));
            }
        };

        let data = parse_yaml(&content)
            .map_err(|e| ToolError::data_load(format!("Failed to parse YAML file {}: {}", path, e)))?;
        debug!("Loaded data from {}", path);

        let data = Arc::new(data);
        self.cache
            .write()
            .await
            .insert(path.to_string(), Arc::clone(&data));
        Ok(data)
    }

    pub async fn load_interface_logs(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::INTERFACE_LOGS, true).await
    }

    pub async fn load_batch_logs(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::BATCH_LOGS, true).await
    }

    pub async fn load_application_logs(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::APPLICATION_LOGS, true).await
    }

    pub async fn load_server_metrics(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::SERVER_METRICS, true).await
    }

    pub async fn load_apm_data(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::APM_DATA, true).await
    }

    pub async fn load_appl_area_metrics(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::APPL_AREA_METRICS, true).await
    }

    pub async fn load_apm_traces(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::APM_TRACES, true).await
    }

    pub async fn load_apm_metrics(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::APM_METRICS, true).await
    }

    pub async fn load_health_check_data(&self) -> ToolResult<Arc<Value>> {
        self.load_yaml(datasets::HEALTH_CHECKS, true).await
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        debug!("Cleared data cache");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;
        let mut cache_keys: Vec<String> = cache.keys().cloned().collect();
        cache_keys.sort();
        CacheStats {
            cached_items: cache.len(),
            cache_keys,
        }
    }

    /// Join a logical path onto the base directory, refusing anything that
    /// could point outside of it.
    fn resolve(&self, path: &str) -> ToolResult<PathBuf> {
        let relative = Path::new(path);
        let contained = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(ToolError::data_load(format!(
                "Path '{}' is outside the data directory",
                path
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

fn parse_yaml(content: &str) -> Result<Value, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value = serde_yaml::from_str(content)?;
    Ok(match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

/// Records stored under `key` in a fixture document, empty if absent.
pub(crate) fn records<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
