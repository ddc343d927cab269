//! Currency exchange rates via open.er-api.com.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::field_or_empty;
use crate::core::http::{FetchClient, endpoint};
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};
use crate::domains::tools::{ToolError, ToolResult};

fn default_amount() -> f64 {
    1.0
}

/// Parameters for the exchange rate tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExchangeRateParams {
    #[schemars(description = "Base currency code, e.g. 'USD', 'EUR', 'JPY'")]
    pub base_currency: String,

    #[schemars(description = "Target currency code for a conversion. Leave empty for all rates")]
    #[serde(default)]
    pub target_currency: Option<String>,

    #[schemars(description = "Amount to convert (default: 1.0)")]
    #[serde(default = "default_amount")]
    pub amount: f64,
}

/// Exchange rate tool.
pub struct ExchangeRateTool {
    client: FetchClient,
    base_url: String,
}

impl ExchangeRateTool {
    pub const NAME: &'static str = "get_exchange_rate";
    pub const BASE_URL: &'static str = "https://open.er-api.com/v6";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Get current exchange rates for a base currency, or convert an amount \
         into a target currency.",
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
}

fn validate_code(key: &str, code: &str) -> ToolResult<()> {
    if code.chars().count() != 3 {
        return Err(ToolError::validation(format!(
            "{} must be a 3-letter currency code",
            key
        )));
    }
    if !code.chars().all(char::is_alphabetic) {
        return Err(ToolError::validation(format!(
            "{} must contain only letters",
            key
        )));
    }
    Ok(())
}

#[async_trait]
impl Tool for ExchangeRateTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ExchangeRateParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        validate_code("base_currency", params.required_str("base_currency")?)?;

        if let Some(target) = params.optional_str("target_currency")? {
            if !target.is_empty() {
                validate_code("target_currency", target)?;
            }
        }

        if let Some(amount) = params.optional_f64("amount")? {
            if amount <= 0.0 {
                return Err(ToolError::validation("amount must be positive"));
            }
        }
        Ok(())
    }

    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let params: ExchangeRateParams = params.deserialize()?;
        let base = params.base_currency.to_uppercase();
        let url = endpoint(&self.base_url, &["latest", base.as_str()])?;

        let data = self.client.get(url.as_str(), &[], &[]).await?;

        if data.get("result").and_then(Value::as_str) == Some("error") {
            let error_type = data
                .get("error-type")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(ToolError::execution(format!(
                "Exchange rate API error: {}",
                error_type
            )));
        }

        let empty = Map::new();
        let rates = data.get("rates").and_then(Value::as_object).unwrap_or(&empty);

        let mut result = Map::new();
        result.insert(
            "base_currency".to_string(),
            data.get("base_code").cloned().unwrap_or_else(|| json!(base)),
        );
        result.insert(
            "last_update".to_string(),
            field_or_empty(&data, "time_last_update_utc"),
        );
        result.insert(
            "next_update".to_string(),
            field_or_empty(&data, "time_next_update_utc"),
        );

        match params.target_currency.filter(|t| !t.is_empty()) {
            Some(target) => {
                let target = target.to_uppercase();
                let rate = rates.get(&target).ok_or_else(|| {
                    ToolError::execution(format!("Target currency '{}' not found", target))
                })?;
                let rate_value = rate.as_f64().ok_or_else(|| {
                    ToolError::execution(format!("Invalid rate for '{}': {}", target, rate))
                })?;
                result.insert(
                    "conversion".to_string(),
                    json!({
                        "from": base,
                        "to": target,
                        "rate": rate,
                        "amount": params.amount,
                        "result": params.amount * rate_value,
                    }),
                );
            }
            None => {
                let currencies: Vec<&String> = rates.keys().collect();
                result.insert("rates".to_string(), Value::Object(rates.clone()));
                result.insert("available_currencies".to_string(), json!(currencies));
            }
        }

        Ok(ToolOutput::Structured(Value::Object(result)))
    }
}
