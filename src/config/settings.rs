//! Configuration settings for Skriv.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub title: TitleSettings,
    pub transcription: TranscriptionSettings,
    pub summarizer: SummarizerSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
    pub store: StoreSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Root directory for per-request scratch media.
    pub scratch_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Timeout applied to every outbound HTTP request, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.skriv".to_string(),
            scratch_dir: "/tmp/skriv".to_string(),
            log_level: "warn".to_string(),
            http_timeout_secs: crate::http::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// How video titles are looked up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TitleProvider {
    /// Local extraction with `yt-dlp --dump-json`.
    #[default]
    #[serde(rename = "yt-dlp")]
    YtDlp,
    /// Remote oEmbed endpoint.
    OEmbed,
}

impl std::str::FromStr for TitleProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yt-dlp" | "ytdlp" | "local" => Ok(TitleProvider::YtDlp),
            "oembed" | "remote" => Ok(TitleProvider::OEmbed),
            _ => Err(format!("Unknown title provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TitleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TitleProvider::YtDlp => write!(f, "yt-dlp"),
            TitleProvider::OEmbed => write!(f, "oembed"),
        }
    }
}

/// Title lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleSettings {
    /// Title provider (yt-dlp, oembed).
    pub provider: TitleProvider,
    /// oEmbed endpoint used by the oembed provider.
    pub oembed_endpoint: String,
}

impl Default for TitleSettings {
    fn default() -> Self {
        Self {
            provider: TitleProvider::YtDlp,
            oembed_endpoint: "https://www.youtube.com/oembed".to_string(),
        }
    }
}

/// How a transcript is obtained for a link.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStrategy {
    /// Download the audio locally, then upload it for speech-to-text.
    #[default]
    Download,
    /// Hand the link straight to the transcription service.
    DirectUrl,
}

impl std::str::FromStr for AcquisitionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "download" | "local" => Ok(AcquisitionStrategy::Download),
            "direct_url" | "direct" | "url" => Ok(AcquisitionStrategy::DirectUrl),
            _ => Err(format!("Unknown acquisition strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for AcquisitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionStrategy::Download => write!(f, "download"),
            AcquisitionStrategy::DirectUrl => write!(f, "direct_url"),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Acquisition strategy (download, direct_url).
    pub strategy: AcquisitionStrategy,
    /// Base URL of the AssemblyAI v2 API.
    pub api_base_url: String,
    /// Audio container produced by the downloader.
    pub audio_format: String,
    /// Audio quality target passed to yt-dlp.
    pub audio_quality: String,
    /// Maximum number of status checks before giving up on a job.
    pub poll_max_attempts: u32,
    /// Delay before the second status check, in milliseconds.
    pub poll_initial_delay_ms: u64,
    /// Upper bound for the delay between status checks, in milliseconds.
    pub poll_max_delay_ms: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            strategy: AcquisitionStrategy::Download,
            api_base_url: "https://api.assemblyai.com/v2".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
            poll_max_attempts: 120,
            poll_initial_delay_ms: 1_000,
            poll_max_delay_ms: 15_000,
        }
    }
}

/// Hosted model used for the primary summarization path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostedProvider {
    /// Hugging Face Inference API (default).
    #[default]
    HuggingFace,
    /// OpenAI chat completions.
    OpenAI,
}

impl std::str::FromStr for HostedProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(HostedProvider::HuggingFace),
            "openai" => Ok(HostedProvider::OpenAI),
            _ => Err(format!("Unknown hosted provider: {}", s)),
        }
    }
}

impl std::fmt::Display for HostedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostedProvider::HuggingFace => write!(f, "huggingface"),
            HostedProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Summarization settings (hosted primary path and local chunked fallback).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Hosted provider (huggingface, openai).
    pub provider: HostedProvider,
    /// Model identifier for the hosted provider.
    pub model: String,
    /// Base URL of the Hugging Face Inference API.
    pub huggingface_base_url: String,
    /// Sampling temperature for the hosted model.
    pub temperature: f32,
    /// Maximum generated tokens for the hosted model.
    pub max_new_tokens: u32,
    /// Instruction prompt; `{{text}}` is replaced by the transcript.
    pub prompt: String,
    /// Whether to fall back to the local chunked summarizer.
    pub fallback_enabled: bool,
    /// Local summarization endpoint.
    pub local_endpoint: String,
    /// Transcript chunk size in characters for the local path.
    pub chunk_size: usize,
    /// Minimum summary length per chunk.
    pub min_length: u32,
    /// Maximum summary length per chunk.
    pub max_length: u32,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            provider: HostedProvider::HuggingFace,
            model: "facebook/bart-large-cnn".to_string(),
            huggingface_base_url: "https://api-inference.huggingface.co/models".to_string(),
            temperature: 0.5,
            max_new_tokens: 500,
            prompt: super::prompts::DEFAULT_ARTICLE_PROMPT.to_string(),
            fallback_enabled: true,
            local_endpoint: "http://127.0.0.1:8080".to_string(),
            chunk_size: 1000,
            min_length: 50,
            max_length: 200,
        }
    }
}

/// Retry and timeout settings for pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Attempts for the title and transcription stages (1 disables retries).
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_initial_delay_ms: u64,
    /// Upper bound for the retry delay, in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Per-attempt timeout of the title stage, in seconds.
    pub title_timeout_secs: u64,
    /// Timeout of the whole transcription stage, retries included, in seconds.
    pub transcription_timeout_secs: u64,
    /// Timeout of the summarization stage, in seconds.
    pub summarization_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 4_000,
            title_timeout_secs: 30,
            transcription_timeout_secs: 2_700,
            summarization_timeout_secs: 600,
        }
    }
}

impl PipelineSettings {
    pub fn title_timeout(&self) -> Duration {
        Duration::from_secs(self.title_timeout_secs)
    }

    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_secs(self.transcription_timeout_secs)
    }

    pub fn summarization_timeout(&self) -> Duration {
        Duration::from_secs(self.summarization_timeout_secs)
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Include error details in responses for unexpected failures.
    pub debug: bool,
    /// Bearer tokens mapped to the user id they authenticate.
    pub tokens: HashMap<String, String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            debug: false,
            tokens: HashMap::new(),
        }
    }
}

/// Article store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.skriv/articles.db".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values that would make a stage misbehave.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SkrivError;

        if self.summarizer.chunk_size == 0 {
            return Err(SkrivError::Config("summarizer.chunk_size must be greater than 0".into()));
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            return Err(SkrivError::Config(
                "summarizer.min_length must not exceed summarizer.max_length".into(),
            ));
        }
        if self.transcription.poll_max_attempts == 0 {
            return Err(SkrivError::Config(
                "transcription.poll_max_attempts must be greater than 0".into(),
            ));
        }
        if self.pipeline.max_attempts == 0 {
            return Err(SkrivError::Config("pipeline.max_attempts must be greater than 0".into()));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SkrivError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skriv")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded scratch directory path.
    pub fn scratch_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.scratch_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.general.http_timeout_secs)
    }
}
