//! AssemblyAI speech-to-text client (v2 REST API).

use super::{SpeechToText, TranscriptJob};
use crate::config::secrets::ASSEMBLYAI_API_KEY;
use crate::error::{Result, SkrivError};
use crate::http::check_status;
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use tracing::{debug, instrument};

const SERVICE: &str = "AssemblyAI";

/// AssemblyAI client.
///
/// Without an explicit key, the key is read from the environment on every
/// call, so a missing key surfaces as a configuration error per request.
pub struct AssemblyAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AssemblyAiClient {
    /// Client that reads its key from the environment.
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Client with a fixed key.
    pub fn with_api_key(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(http, base_url)
        }
    }

    fn key(&self) -> Result<String> {
        match &self.api_key {
            Some(key) => Ok(key.clone()),
            None => ASSEMBLYAI_API_KEY.require(),
        }
    }

    fn string_field(value: &serde_json::Value, field: &str) -> Result<String> {
        value[field]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SkrivError::Transcription(format!("{SERVICE} response has no '{field}'")))
    }
}

#[async_trait]
impl SpeechToText for AssemblyAiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn ensure_configured(&self) -> Result<()> {
        self.key().map(|_| ())
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn upload(&self, audio_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        debug!("Uploading {} bytes", bytes.len());

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("authorization", self.key()?)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let json: serde_json::Value = check_status(SERVICE, response).await?.json().await?;
        Self::string_field(&json, "upload_url")
    }

    #[instrument(skip(self))]
    async fn submit(&self, audio_url: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", self.key()?)
            .json(&json!({ "audio_url": audio_url }))
            .send()
            .await?;

        let json: serde_json::Value = check_status(SERVICE, response).await?.json().await?;
        let id = Self::string_field(&json, "id")?;
        debug!("Created transcript job {}", id);
        Ok(id)
    }

    async fn fetch(&self, job_id: &str) -> Result<TranscriptJob> {
        let response = self
            .http
            .get(format!("{}/transcript/{}", self.base_url, job_id))
            .header("authorization", self.key()?)
            .send()
            .await?;

        let json: serde_json::Value = check_status(SERVICE, response).await?.json().await?;
        Ok(TranscriptJob::from_value(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_is_configured() {
        let client = AssemblyAiClient::with_api_key(
            reqwest::Client::new(),
            "https://api.assemblyai.com/v2/",
            "test-key",
        );
        assert!(client.ensure_configured().is_ok());
        assert_eq!(client.base_url, "https://api.assemblyai.com/v2");
    }
}
