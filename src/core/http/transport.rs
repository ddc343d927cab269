//! A single HTTP attempt and its classified outcome.

use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

use crate::core::config::HttpClientConfig;

/// HTTP method supported by the fetch client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A fully resolved request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
}

/// The result of one HTTP attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 2xx response with its raw body.
    Success { status: u16, body: String },
    /// The attempt exceeded the configured deadline.
    Timeout(String),
    /// Connection-level failure (DNS, refused, reset...).
    Network(String),
    /// Non-2xx response.
    HttpStatus { status: u16, body: String },
}

impl FetchOutcome {
    /// Whether the retry loop should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }

    /// Short label for log lines.
    pub fn label(&self) -> String {
        match self {
            Self::Success { status, .. } => format!("success ({})", status),
            Self::Timeout(_) => "timeout".to_string(),
            Self::Network(cause) => format!("network error: {}", cause),
            Self::HttpStatus { status, .. } => format!("http status {}", status),
        }
    }
}

/// Performs exactly one HTTP attempt.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> FetchOutcome;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the configured request timeout.
    pub fn new(config: &HttpClientConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &FetchRequest) -> FetchOutcome {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return classify_error(e),
        };

        if status.is_success() {
            FetchOutcome::Success {
                status: status.as_u16(),
                body,
            }
        } else {
            FetchOutcome::HttpStatus {
                status: status.as_u16(),
                body,
            }
        }
    }
}

fn classify_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout(e.to_string())
    } else {
        FetchOutcome::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_outcomes() {
        assert!(FetchOutcome::Timeout("t".into()).is_transient());
        assert!(FetchOutcome::Network("refused".into()).is_transient());
        assert!(
            !FetchOutcome::HttpStatus {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !FetchOutcome::Success {
                status: 200,
                body: "{}".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(&HttpClientConfig::default()).is_ok());
    }
}
