//! Video links and platform identifiers.

use crate::error::{Result, SkrivError};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// A syntactically plausible video link.
///
/// Only the shape is checked (absolute http(s) URL with a host); whether the
/// link points at an existing video is left to the services downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLink {
    url: Url,
}

impl VideoLink {
    /// Parse and validate a link.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let url = Url::parse(trimmed)
            .map_err(|e| SkrivError::InvalidInput(format!("'{}' is not a URL: {}", trimmed, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SkrivError::InvalidInput(format!(
                "Unsupported link scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(SkrivError::InvalidInput(format!("Link has no host: {}", trimmed)));
        }

        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Best-effort platform identifier, used to label logs.
    ///
    /// YouTube links yield the 11-character video id; other links yield their
    /// last non-empty path segment.
    pub fn platform_id(&self) -> Option<String> {
        if let Some(caps) = youtube_id_regex().captures(self.url.as_str()) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }

        self.url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
    }
}

impl std::fmt::Display for VideoLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn youtube_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .expect("static regex is valid")
    })
}
