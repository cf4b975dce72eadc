//! HTTP and OpenAI client construction with sensible defaults.

use crate::error::{Result, SkrivError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for outbound API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an HTTP client with the given request timeout.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("skriv/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SkrivError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Create an OpenAI client with the given API key and timeout.
pub fn create_openai_client(api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let config = OpenAIConfig::new().with_api_key(api_key);
    Ok(Client::with_config(config).with_http_client(create_client(timeout)?))
}

/// Turn a non-success response into a [`SkrivError::Service`].
///
/// The body is read for the error message; the service's own `error` field is
/// preferred when the body is JSON.
pub async fn check_status(service: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or(body);

    Err(SkrivError::Service {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}
