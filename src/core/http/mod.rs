//! HTTP fetch client used by the API-backed tools.
//!
//! One logical request is one call to [`FetchClient::get`] or
//! [`FetchClient::post`]. Timeouts and connection failures are retried with
//! exponential backoff; HTTP status errors are reported immediately.
//!
//! The actual network attempt is behind the [`HttpTransport`] trait so tests
//! can script outcomes and count calls.

mod retry;
mod transport;

pub use retry::RetryPolicy;
pub use transport::{FetchOutcome, FetchRequest, HttpTransport, Method, ReqwestTransport};

use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::config::HttpClientConfig;
use crate::domains::tools::{ToolError, ToolResult};

/// Fetch client with retry policy and error mapping.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl FetchClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Create a `reqwest`-backed client from configuration.
    pub fn from_config(config: &HttpClientConfig) -> ToolResult<Self> {
        let transport = ReqwestTransport::new(config).map_err(|e| {
            ToolError::configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        let policy = RetryPolicy::from_config(config)?;
        Ok(Self::new(Arc::new(transport), policy))
    }

    /// The retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Perform a GET request and parse the JSON body.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> ToolResult<Value> {
        let request = FetchRequest {
            method: Method::Get,
            url: parse_url(url)?,
            query: to_owned_pairs(query),
            headers: to_owned_pairs(headers),
            json: None,
        };
        self.fetch(request).await
    }

    /// Perform a POST request with a JSON body and parse the JSON response.
    pub async fn post(
        &self,
        url: &str,
        json: &Value,
        headers: &[(&str, &str)],
    ) -> ToolResult<Value> {
        let request = FetchRequest {
            method: Method::Post,
            url: parse_url(url)?,
            query: Vec::new(),
            headers: to_owned_pairs(headers),
            json: Some(json.clone()),
        };
        self.fetch(request).await
    }

    async fn fetch(&self, request: FetchRequest) -> ToolResult<Value> {
        let method = request.method.as_str();
        let url = request.url.as_str();
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            let outcome = self.transport.send(&request).await;
            info!(
                method,
                url,
                attempt = attempt + 1,
                max_attempts,
                outcome = %outcome.label(),
                "HTTP request"
            );

            match outcome {
                FetchOutcome::Success { body, .. } => {
                    return serde_json::from_str(&body).map_err(|e| {
                        error!("Invalid JSON from {}: {}", url, e);
                        ToolError::upstream(
                            format!("Invalid JSON response from {}: {}", url, e),
                            None,
                            Some(body),
                        )
                    });
                }
                FetchOutcome::HttpStatus { status, body } => {
                    error!(status, "HTTP error for {}", url);
                    return Err(ToolError::upstream(
                        format!("HTTP {} error for {}", status, url),
                        Some(status),
                        Some(body),
                    ));
                }
                FetchOutcome::Timeout(cause) | FetchOutcome::Network(cause)
                    if attempt + 1 < max_attempts =>
                {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        "Transient failure for {} ({}), retrying in {:?}",
                        url, cause, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                FetchOutcome::Timeout(cause) => {
                    error!("Request timeout for {}: {}", url, cause);
                    return Err(ToolError::timeout(format!(
                        "Request to {} timed out after {} attempt(s): {}",
                        url, max_attempts, cause
                    )));
                }
                FetchOutcome::Network(cause) => {
                    error!("Request error for {}: {}", url, cause);
                    return Err(ToolError::upstream(
                        format!("Request failed for {}: {}", url, cause),
                        None,
                        None,
                    ));
                }
            }
        }
    }
}

/// Build an endpoint URL by appending path segments to a base URL.
///
/// Segments are percent-encoded, so free text such as a city name can be
/// used directly. An empty trailing segment yields a trailing slash.
pub fn endpoint(base: &str, segments: &[&str]) -> ToolResult<Url> {
    let mut url = parse_url(base)?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ToolError::configuration(format!("Base URL cannot have a path: {}", base)))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

fn parse_url(url: &str) -> ToolResult<Url> {
    Url::parse(url).map_err(|e| ToolError::validation(format!("Invalid URL '{}': {}", url, e)))
}

fn to_owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Scripted transport shared by the fetch client and API tool tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed list of outcomes and records every request.
    pub struct ScriptedTransport {
        outcomes: Mutex<VecDeque<FetchOutcome>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(outcomes: Vec<FetchOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        /// A transport that answers once with a 200 and the given JSON.
        pub fn json(body: Value) -> Arc<Self> {
            Self::new(vec![FetchOutcome::Success {
                status: 200,
                body: body.to_string(),
            }])
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_url(&self) -> Option<String> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|r| r.url.to_string())
        }

        pub fn last_query(&self) -> Vec<(String, String)> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|r| r.query.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: &FetchRequest) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| FetchOutcome::Network("script exhausted".to_string()))
        }
    }

    /// Fetch client over a scripted transport with no backoff delay.
    pub fn client(transport: Arc<ScriptedTransport>) -> FetchClient {
        FetchClient::new(transport, RetryPolicy::immediate(3))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ScriptedTransport, client};
    use super::*;
    use serde_json::json;

    fn ok(body: &str) -> FetchOutcome {
        FetchOutcome::Success {
            status: 200,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_after_two_transient_failures() {
        let transport = ScriptedTransport::new(vec![
            FetchOutcome::Timeout("deadline".into()),
            FetchOutcome::Network("connection reset".into()),
            ok(r#"{"ok": true}"#),
        ]);
        let result = client(transport.clone())
            .get("https://api.example.test/x", &[], &[])
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true}));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_retries() {
        let transport = ScriptedTransport::new(vec![
            FetchOutcome::Timeout("a".into()),
            FetchOutcome::Timeout("b".into()),
            FetchOutcome::Timeout("c".into()),
        ]);
        let err = client(transport.clone())
            .get("https://api.example.test/x", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
        assert!(err.message().contains("c"));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_network_failures_exhaust_retries() {
        let transport = ScriptedTransport::new(vec![
            FetchOutcome::Network("refused".into()),
            FetchOutcome::Network("refused".into()),
            FetchOutcome::Network("dns failure".into()),
        ]);
        let err = client(transport.clone())
            .get("https://api.example.test/x", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UpstreamApi { status: None, .. }));
        assert!(err.message().contains("dns failure"));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_http_status_is_not_retried() {
        let transport = ScriptedTransport::new(vec![FetchOutcome::HttpStatus {
            status: 404,
            body: "missing".into(),
        }]);
        let err = client(transport.clone())
            .get("https://api.example.test/x", &[], &[])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.details()["response_text"], "missing");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_json_body_is_upstream_error() {
        let transport = ScriptedTransport::new(vec![ok("<html>nope</html>")]);
        let err = client(transport.clone())
            .get("https://api.example.test/x", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UpstreamApi { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_url_never_hits_transport() {
        let transport = ScriptedTransport::new(vec![]);
        let err = client(transport.clone())
            .get("not a url", &[], &[])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let transport = ScriptedTransport::json(json!({"created": 1}));
        let result = client(transport.clone())
            .post("https://api.example.test/items", &json!({"a": 1}), &[])
            .await
            .unwrap();
        assert_eq!(result["created"], 1);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_query_is_forwarded() {
        let transport = ScriptedTransport::json(json!({}));
        client(transport.clone())
            .get("https://wttr.in/London", &[("format", "j1")], &[])
            .await
            .unwrap();
        assert_eq!(
            transport.last_query(),
            vec![("format".to_string(), "j1".to_string())]
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint("https://wttr.in", &["Tokyo, Japan"]).unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/Tokyo,%20Japan");

        let url = endpoint("https://ipapi.co", &["8.8.8.8", "json", ""]).unwrap();
        assert_eq!(url.as_str(), "https://ipapi.co/8.8.8.8/json/");

        let url = endpoint("https://api.dictionaryapi.dev/api/v2/entries/en", &["hello"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.dictionaryapi.dev/api/v2/entries/en/hello"
        );
    }

    #[test]
    fn test_infinite_retry_delay_is_configuration_error() {
        let config = crate::core::config::Config::from_yaml_str("http:\n  retry_delay_secs: .inf\n")
            .unwrap();
        let err = FetchClient::from_config(&config.http).err().unwrap();
        assert!(matches!(err, ToolError::Configuration(_)));
        assert!(err.message().contains("retry_delay_secs"));
    }
}
