//! Current weather conditions from wttr.in.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{field_or_empty, first, first_value};
use crate::core::http::{FetchClient, endpoint};
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};
use crate::domains::tools::{ToolError, ToolResult};

/// Parameters for the weather tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WeatherParams {
    #[schemars(description = "Location name, e.g. 'London', 'New York', 'Tokyo'")]
    pub location: String,
}

/// Weather lookup tool.
pub struct WeatherTool {
    client: FetchClient,
    base_url: String,
}

impl WeatherTool {
    pub const NAME: &'static str = "get_weather";
    pub const BASE_URL: &'static str = "https://wttr.in";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Get current weather information for a location. Returns temperature, \
         conditions, humidity, wind and more.",
    );

    pub fn new(client: FetchClient) -> Self {
        Self::with_base_url(client, Self::BASE_URL)
    }

    pub fn with_base_url(client: FetchClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn normalize(location: &str, data: &Value) -> Value {
        let current = first(data, "current_condition");
        let area = first(data, "nearest_area");

        json!({
            "location": {
                "name": first_value(area, "areaName").unwrap_or_else(|| json!(location)),
                "country": first_value(area, "country").unwrap_or_else(|| json!("")),
                "region": first_value(area, "region").unwrap_or_else(|| json!("")),
            },
            "current": {
                "temperature_c": field_or_empty(current, "temp_C"),
                "temperature_f": field_or_empty(current, "temp_F"),
                "feels_like_c": field_or_empty(current, "FeelsLikeC"),
                "feels_like_f": field_or_empty(current, "FeelsLikeF"),
                "condition": first_value(current, "weatherDesc").unwrap_or_else(|| json!("")),
                "humidity": field_or_empty(current, "humidity"),
                "precipitation_mm": field_or_empty(current, "precipMM"),
                "pressure_mb": field_or_empty(current, "pressure"),
                "wind_speed_kmph": field_or_empty(current, "windspeedKmph"),
                "wind_direction": field_or_empty(current, "winddir16Point"),
                "cloud_cover": field_or_empty(current, "cloudcover"),
                "uv_index": field_or_empty(current, "uvIndex"),
                "visibility_km": field_or_empty(current, "visibility"),
            },
            "observation_time": field_or_empty(current, "observation_time"),
        })
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<WeatherParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        let location = params.required_str("location")?;
        if location.trim().is_empty() {
            return Err(ToolError::validation("location cannot be empty"));
        }
        Ok(())
    }

    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let params: WeatherParams = params.deserialize()?;
        let url = endpoint(&self.base_url, &[params.location.as_str()])?;
        let data = self
            .client
            .get(url.as_str(), &[("format", "j1")], &[])
            .await?;
        Ok(ToolOutput::Structured(Self::normalize(&params.location, &data)))
    }
}
