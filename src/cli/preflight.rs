//! Pre-flight checks before running the pipeline.
//!
//! Validates that the tools and secrets the configured providers need are
//! available before starting work that would otherwise fail midway.

use crate::config::secrets::{Secret, ASSEMBLYAI_API_KEY, HUGGINGFACE_TOKEN, OPENAI_API_KEY};
use crate::config::{AcquisitionStrategy, HostedProvider, Settings, TitleProvider};
use crate::error::{Result, SkrivError};
use std::process::Command;

/// External tools needed by the configured providers.
pub fn required_tools(settings: &Settings) -> Vec<&'static str> {
    let mut tools = Vec::new();
    if settings.title.provider == TitleProvider::YtDlp
        || settings.transcription.strategy == AcquisitionStrategy::Download
    {
        tools.push("yt-dlp");
    }
    if settings.transcription.strategy == AcquisitionStrategy::Download {
        tools.push("ffmpeg");
    }
    tools
}

/// Secrets needed by the configured providers.
pub fn required_secrets(settings: &Settings) -> Vec<Secret> {
    let hosted = match settings.summarizer.provider {
        HostedProvider::HuggingFace => HUGGINGFACE_TOKEN,
        HostedProvider::OpenAI => OPENAI_API_KEY,
    };
    vec![ASSEMBLYAI_API_KEY, hosted]
}

/// Check everything a pipeline run needs.
///
/// The hosted model's secret is not required when the local fallback is
/// enabled, since the run can still succeed without it.
pub fn check(settings: &Settings) -> Result<()> {
    for tool in required_tools(settings) {
        check_tool(tool)?;
    }

    for secret in required_secrets(settings) {
        let optional = settings.summarizer.fallback_enabled && secret != ASSEMBLYAI_API_KEY;
        if secret.lookup().is_none() && !optional {
            return Err(secret.missing());
        }
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SkrivError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SkrivError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SkrivError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_url_with_oembed_needs_no_tools() {
        let mut settings = Settings::default();
        settings.title.provider = TitleProvider::OEmbed;
        settings.transcription.strategy = AcquisitionStrategy::DirectUrl;
        assert!(required_tools(&settings).is_empty());
    }

    #[test]
    fn test_download_needs_ytdlp_and_ffmpeg() {
        let settings = Settings::default();
        assert_eq!(required_tools(&settings), vec!["yt-dlp", "ffmpeg"]);
    }

    #[test]
    fn test_secrets_follow_provider() {
        let mut settings = Settings::default();
        assert_eq!(required_secrets(&settings), vec![ASSEMBLYAI_API_KEY, HUGGINGFACE_TOKEN]);

        settings.summarizer.provider = HostedProvider::OpenAI;
        assert_eq!(required_secrets(&settings), vec![ASSEMBLYAI_API_KEY, OPENAI_API_KEY]);
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("skriv-no-such-tool"),
            Err(SkrivError::ToolNotFound(_))
        ));
    }
}
