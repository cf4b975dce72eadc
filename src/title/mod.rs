//! Title lookup for video links.
//!
//! Two deployment variants exist: local extraction through yt-dlp, and a
//! remote oEmbed lookup. Every failure cause collapses into
//! [`SkrivError::TitleLookup`].

mod oembed;
mod ytdlp;

pub use oembed::OEmbedTitleResolver;
pub use ytdlp::YtDlpTitleResolver;

use crate::config::{Settings, TitleProvider};
use crate::error::{Result, SkrivError};
use crate::link::VideoLink;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves a human-readable title for a video link.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    /// Short name of the backing service, for logs.
    fn name(&self) -> &str;

    /// Look up the title. Blank titles are reported as failures.
    async fn resolve_title(&self, link: &VideoLink) -> Result<String>;
}

/// Build the resolver selected in the settings.
pub fn create_resolver(settings: &Settings, http: reqwest::Client) -> Arc<dyn TitleResolver> {
    match settings.title.provider {
        TitleProvider::YtDlp => Arc::new(YtDlpTitleResolver::new()),
        TitleProvider::OEmbed => Arc::new(OEmbedTitleResolver::new(
            http,
            &settings.title.oembed_endpoint,
        )),
    }
}

/// Pull a usable title out of a metadata document.
pub(crate) fn title_from_json(json: &serde_json::Value) -> Result<String> {
    json["title"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SkrivError::TitleLookup("metadata has no title".to_string()))
}
