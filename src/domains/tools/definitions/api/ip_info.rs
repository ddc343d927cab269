//! IP geolocation lookup via ipapi.co.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::field_or_empty;
use crate::core::http::{FetchClient, endpoint};
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};
use crate::domains::tools::{ToolError, ToolResult};

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("IPv4 pattern is valid")
});

static IPV6: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-fA-F]{0,4}:){7}[0-9a-fA-F]{0,4}$").expect("IPv6 pattern is valid")
});

const RATE_LIMIT_MESSAGE: &str = "API rate limit exceeded. The free ipapi.co service limits \
                                  requests. Please try again later or use a specific IP address.";

/// Whether `ip` is a dotted-quad IPv4 address or a full-form IPv6 address.
///
/// The IPv6 check only accepts the eight-group colon-hex form; `::`
/// abbreviations are rejected.
pub fn is_valid_ip(ip: &str) -> bool {
    if IPV4.is_match(ip) {
        return ip.split('.').all(|octet| octet.parse::<u16>().is_ok_and(|n| n <= 255));
    }
    IPV6.is_match(ip)
}

/// Parameters for the IP info tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IpInfoParams {
    #[schemars(description = "IPv4 or IPv6 address to look up. Leave empty for the caller's own IP")]
    #[serde(default)]
    pub ip_address: String,
}

/// IP geolocation tool.
pub struct IpInfoTool {
    client: FetchClient,
    base_url: String,
}

impl IpInfoTool {
    pub const NAME: &'static str = "get_ip_info";
    pub const BASE_URL: &'static str = "https://ipapi.co";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Get geolocation and network information for an IP address. Returns \
         location, ISP, timezone and currency. Leave ip_address empty for your own IP.",
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

    /// Upstream signals failures in a 200 body: `{"error": true, "reason": ...}`.
    fn check_upstream_error(data: &Value) -> ToolResult<()> {
        let flag = match data.get("error") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(()),
            Some(Value::String(s)) if s.is_empty() => return Ok(()),
            Some(flag) => flag,
        };

        let reason = data
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        if reason.to_lowercase().contains("rate limit") || flag == &Value::Bool(true) {
            return Err(ToolError::execution(RATE_LIMIT_MESSAGE));
        }
        Err(ToolError::execution(format!("API error: {}", reason)))
    }

    fn normalize(data: &Value) -> Value {
        json!({
            "ip": field_or_empty(data, "ip"),
            "location": {
                "city": field_or_empty(data, "city"),
                "region": field_or_empty(data, "region"),
                "region_code": field_or_empty(data, "region_code"),
                "country": field_or_empty(data, "country_name"),
                "country_code": field_or_empty(data, "country_code"),
                "continent_code": field_or_empty(data, "continent_code"),
                "postal": field_or_empty(data, "postal"),
                "latitude": field_or_empty(data, "latitude"),
                "longitude": field_or_empty(data, "longitude"),
                "timezone": field_or_empty(data, "timezone"),
            },
            "network": {
                "asn": field_or_empty(data, "asn"),
                "org": field_or_empty(data, "org"),
                "isp": field_or_empty(data, "isp"),
            },
            "currency": {
                "code": field_or_empty(data, "currency"),
                "name": field_or_empty(data, "currency_name"),
            },
            "languages": field_or_empty(data, "languages"),
        })
    }
}

#[async_trait]
impl Tool for IpInfoTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<IpInfoParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        match params.optional_str("ip_address")? {
            Some(ip) if !ip.is_empty() && !is_valid_ip(ip.trim()) => Err(ToolError::validation(
                format!("Invalid IP address format: {}", ip),
            )),
            _ => Ok(()),
        }
    }

    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let params: IpInfoParams = params.deserialize()?;
        let ip = params.ip_address.trim();
        let url = if ip.is_empty() {
            endpoint(&self.base_url, &["json", ""])?
        } else {
            endpoint(&self.base_url, &[ip, "json", ""])?
        };

        let data = match self.client.get(url.as_str(), &[], &[]).await {
            Err(ToolError::UpstreamApi {
                status: Some(429),
                body,
                ..
            }) => return Err(ToolError::upstream(RATE_LIMIT_MESSAGE, Some(429), body)),
            other => other?,
        };

        Self::check_upstream_error(&data)?;
        Ok(ToolOutput::Structured(Self::normalize(&data)))
    }
}
