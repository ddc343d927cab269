//! Configuration management for the MCP servers.
//!
//! Configuration is resolved in three layers: built-in defaults, an optional
//! YAML file, then `MCP_*` environment variables. The result is built once in
//! the binary and shared read-only.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File looked up in the working directory when `MCP_CONFIG_FILE` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Main configuration structure for the MCP servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Outbound HTTP client settings for the API-backed tools.
    pub http: HttpClientConfig,

    /// Per-tool enable switches for the public API server.
    pub features: FeaturesConfig,

    /// Location of the fixture files used by the monitoring server.
    pub data: DataConfig,

    /// Warning and critical thresholds for the monitoring status labels.
    pub thresholds: ThresholdsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Human-readable text or one JSON object per line.
    pub format: LogFormat,

    /// Optional log file. Logs go to stderr when unset.
    pub file: Option<PathBuf>,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Per-attempt timeout in seconds.
    pub request_timeout_secs: u64,

    /// Total attempts for a request whose failures are transient.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay_secs: f64,

    /// Upper bound for a single retry delay.
    pub max_retry_delay_secs: f64,
}

/// Which API-backed tools are registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub enable_weather_tool: bool,
    pub enable_ip_info_tool: bool,
    pub enable_dictionary_tool: bool,
    pub enable_exchange_rate_tool: bool,
}

/// Fixture data location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the YAML fixtures.
    pub base_path: PathBuf,
}

/// Thresholds used to derive `status` labels on performance series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub cpu_warning: f64,
    pub cpu_critical: f64,
    pub memory_warning: f64,
    pub memory_critical: f64,
    /// Error rate thresholds, in percent.
    pub error_rate_warning: f64,
    pub error_rate_critical: f64,
    pub latency_warning_ms: f64,
    pub latency_critical_ms: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "ops-tools-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
            with_timestamps: true,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 1.0,
            max_retry_delay_secs: 10.0,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enable_weather_tool: true,
            enable_ip_info_tool: true,
            enable_dictionary_tool: true,
            enable_exchange_rate_tool: true,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data"),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cpu_warning: 70.0,
            cpu_critical: 85.0,
            memory_warning: 80.0,
            memory_critical: 90.0,
            error_rate_warning: 1.0,
            error_rate_critical: 5.0,
            latency_warning_ms: 500.0,
            latency_critical_ms: 1000.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            http: HttpClientConfig::default(),
            features: FeaturesConfig::default(),
            data: DataConfig::default(),
            thresholds: ThresholdsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the full configuration for a server binary.
    ///
    /// `server_name` is the default reported name; a YAML file or
    /// `MCP_SERVER_NAME` may still override it.
    pub fn load(server_name: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match config_file_path() {
            Some(path) => Self::from_yaml_file_with_name(&path, server_name)?,
            None => {
                let mut config = Self::default();
                config.server.name = server_name.to_string();
                config
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from environment variables on top of defaults.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Parse a YAML document. Missing sections and keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::config(format!("Invalid YAML: {}", e)))
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
            .map_err(|e| Error::config(format!("{} ({})", e, path.display())))
    }

    fn from_yaml_file_with_name(path: &Path, server_name: &str) -> Result<Self> {
        let mut config = Self::from_yaml_file(path)?;
        if config.server.name == ServerConfig::default().name {
            config.server.name = server_name.to_string();
        }
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Apply `MCP_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            self.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MCP_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "text" => self.logging.format = LogFormat::Text,
                other => warn!("Ignoring unknown MCP_LOG_FORMAT '{}'", other),
            }
        }
        if let Ok(file) = std::env::var("MCP_LOG_FILE") {
            self.logging.file = (!file.is_empty()).then(|| PathBuf::from(file));
        }

        // Keep a transport from the config file unless one is requested explicitly
        if std::env::var("MCP_TRANSPORT").is_ok() {
            self.transport = TransportConfig::from_env();
        }

        env_parse("MCP_REQUEST_TIMEOUT_SECS", &mut self.http.request_timeout_secs);
        env_parse("MCP_MAX_RETRIES", &mut self.http.max_retries);
        env_parse("MCP_RETRY_DELAY_SECS", &mut self.http.retry_delay_secs);
        env_parse("MCP_MAX_RETRY_DELAY_SECS", &mut self.http.max_retry_delay_secs);

        env_flag("MCP_ENABLE_WEATHER_TOOL", &mut self.features.enable_weather_tool);
        env_flag("MCP_ENABLE_IP_INFO_TOOL", &mut self.features.enable_ip_info_tool);
        env_flag("MCP_ENABLE_DICTIONARY_TOOL", &mut self.features.enable_dictionary_tool);
        env_flag(
            "MCP_ENABLE_EXCHANGE_RATE_TOOL",
            &mut self.features.enable_exchange_rate_tool,
        );

        if let Ok(path) = std::env::var("MCP_DATA_PATH") {
            self.data.base_path = PathBuf::from(path);
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    match std::env::var("MCP_CONFIG_FILE") {
        Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring invalid value for {}: '{}'", key, raw),
        }
    }
}

fn env_flag(key: &str, target: &mut bool) {
    if let Ok(raw) = std::env::var(key) {
        *target = !matches!(raw.to_lowercase().as_str(), "false" | "0" | "no" | "off");
    }
}
