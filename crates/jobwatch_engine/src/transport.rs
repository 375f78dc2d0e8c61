use std::time::Duration;

use futures_util::StreamExt;
use jobwatch_core::ApiError;
use jobwatch_logging::watch_debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::{json, Value};

pub const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// GraphQL endpoint; the operation alias is appended as `?alias=`.
    pub api_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: u64,
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            api_url: "https://www.upwork.com/api/graphql/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 8 * 1024 * 1024,
            user_agent: concat!("jobwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Executes one authenticated GraphQL request.
///
/// Returns the `data` object on success. Failures are classified, not
/// interpreted: GraphQL error messages are passed through verbatim.
#[async_trait::async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn execute(
        &self,
        token: &str,
        alias: &str,
        query: &str,
        variables: &Value,
    ) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: TransportSettings,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint_url(&self, alias: &str) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&self.settings.api_url)
            .map_err(|err| ApiError::network(format!("invalid api url: {err}")))?;
        url.query_pairs_mut().append_pair("alias", alias);
        Ok(url)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let max_bytes = self.settings.max_body_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ApiError::parsing(format!(
                "response body exceeds {max_bytes} bytes"
            )));
        }
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| ApiError::network(err.to_string()))?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::parsing(format!(
                    "response body exceeds {max_bytes} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl GraphQlTransport for ReqwestTransport {
    async fn execute(
        &self,
        token: &str,
        alias: &str,
        query: &str,
        variables: &Value,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint_url(alias)?;
        let body = json!({ "query": query, "variables": variables }).to_string();

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .body(body)
            .send()
            .await
            .map_err(|err| ApiError::network(err.to_string()))?;

        let status = response.status();
        let bytes = self.read_body(response).await?;
        watch_debug!(
            "GraphQL {} answered {} with {} bytes",
            alias,
            status.as_u16(),
            bytes.len()
        );

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: truncate_chars(&String::from_utf8_lossy(&bytes), ERROR_BODY_LIMIT),
            });
        }

        classify_body(&bytes)
    }
}

/// Splits a 2xx body into `data`, GraphQL-level errors, or a parse failure.
pub fn classify_body(bytes: &[u8]) -> Result<Value, ApiError> {
    let mut payload: Value = serde_json::from_slice(bytes)
        .map_err(|err| ApiError::parsing(format!("body is not JSON: {err}")))?;

    if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|error| {
                    error
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string())
                })
                .collect();
            return Err(ApiError::GraphQl { messages });
        }
    }

    match payload.get_mut("data").map(Value::take) {
        Some(data) if data.is_object() => Ok(data),
        _ => Err(ApiError::parsing("response has no data object")),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
