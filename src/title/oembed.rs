//! Title lookup through a remote oEmbed endpoint.

use super::{title_from_json, TitleResolver};
use crate::error::Result;
use crate::http::check_status;
use crate::link::VideoLink;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Resolves titles with `GET <endpoint>?url=<link>&format=json`.
pub struct OEmbedTitleResolver {
    http: reqwest::Client,
    endpoint: String,
}

impl OEmbedTitleResolver {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl TitleResolver for OEmbedTitleResolver {
    fn name(&self) -> &str {
        "oembed"
    }

    #[instrument(skip(self), fields(link = %link))]
    async fn resolve_title(&self, link: &VideoLink) -> Result<String> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("url", link.as_str()), ("format", "json")])
            .send()
            .await?;

        let json: serde_json::Value = check_status("oEmbed", response).await?.json().await?;

        let title = title_from_json(&json)?;
        debug!("Resolved title '{}'", title);
        Ok(title)
    }
}
