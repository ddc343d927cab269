//! Tool definitions module.
//!
//! - `api` - tools backed by public, key-less HTTP APIs
//! - `monitoring` - tools serving YAML fixtures in monitoring wire formats

pub mod api;
pub mod monitoring;

pub use api::{DictionaryTool, ExchangeRateTool, IpInfoTool, WeatherTool};
pub use monitoring::{
    ApiHealthTool, ApmTool, AppPerformanceTool, ApplicationLogsTool, AreaPerformanceTool,
    BatchLogsTool, InterfaceLogsTool, ServerPerformanceTool,
};
