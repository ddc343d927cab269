//! Logging setup.
//!
//! Logs never go to stdout: in STDIO mode stdout carries the MCP protocol.

use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use super::config::{LogFormat, LoggingConfig};
use super::error::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// When a log file is configured the returned guard must be kept alive for
/// the lifetime of the process, otherwise buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(&config.level).into())
        .from_env_lossy();

    let (writer, guard) = match &config.file {
        Some(path) => {
            let (dir, name) = log_file_parts(path);
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> =
        match (config.format, config.with_timestamps) {
            (LogFormat::Json, true) => fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer)
                .boxed(),
            (LogFormat::Json, false) => fmt::layer()
                .json()
                .without_time()
                .with_writer(writer)
                .boxed(),
            (LogFormat::Text, true) => fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
            (LogFormat::Text, false) => fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .without_time()
                .with_writer(writer)
                .boxed(),
        };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| Error::logging(e.to_string()))?;

    Ok(guard)
}

/// Map a configured level name to a tracing level, defaulting to INFO.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn log_file_parts(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("server.log"));
    (dir, name)
}
