//! Error types for Skriv.

use thiserror::Error;

/// Library-level error type for Skriv operations.
#[derive(Error, Debug)]
pub enum SkrivError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing {name}: set one of {candidates}")]
    MissingSecret { name: String, candidates: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Title lookup failed: {0}")]
    TitleLookup(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("{service} returned HTTP {status}: {message}")]
    Service {
        service: String,
        status: u16,
        message: String,
    },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Article store error: {0}")]
    Store(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl SkrivError {
    /// Whether retrying the same operation could plausibly succeed.
    ///
    /// Configuration, input and authentication problems are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            SkrivError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            SkrivError::Service { status, .. } => *status >= 500 || *status == 429,
            SkrivError::Timeout(_)
            | SkrivError::ToolFailed(_)
            | SkrivError::AudioDownload(_)
            | SkrivError::OpenAI(_) => true,
            SkrivError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

/// Result type alias for Skriv operations.
pub type Result<T> = std::result::Result<T, SkrivError>;
