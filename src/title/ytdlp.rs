//! Title lookup through a local yt-dlp extraction.

use super::{title_from_json, TitleResolver};
use crate::error::{Result, SkrivError};
use crate::link::VideoLink;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Resolves titles by asking yt-dlp for the video's metadata.
pub struct YtDlpTitleResolver {
    program: String,
}

impl YtDlpTitleResolver {
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    /// Use a specific yt-dlp executable.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for YtDlpTitleResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TitleResolver for YtDlpTitleResolver {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self), fields(link = %link))]
    async fn resolve_title(&self, link: &VideoLink) -> Result<String> {
        let output = Command::new(&self.program)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                link.as_str(),
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SkrivError::ToolNotFound(self.program.clone())
                } else {
                    SkrivError::ToolFailed(format!("Failed to run {}: {}", self.program, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkrivError::TitleLookup(format!(
                "yt-dlp could not read metadata: {}",
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| SkrivError::TitleLookup(format!("Failed to parse yt-dlp output: {}", e)))?;

        let title = title_from_json(&json)?;
        debug!("Resolved title '{}'", title);
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_reported() {
        let resolver = YtDlpTitleResolver::with_program("skriv-test-no-such-yt-dlp");
        let link = VideoLink::parse("https://example.com/v/abc").unwrap();

        match resolver.resolve_title(&link).await {
            Err(SkrivError::ToolNotFound(name)) => assert_eq!(name, "skriv-test-no-such-yt-dlp"),
            other => panic!("expected ToolNotFound, got {:?}", other),
        }
    }
}
