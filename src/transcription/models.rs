//! Data models for transcription.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plain-text rendering of a video's spoken audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Transcript text.
    pub text: String,
    /// Link the audio came from.
    pub source_link: String,
}

impl Transcript {
    pub fn new(text: impl Into<String>, source_link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_link: source_link.into(),
        }
    }

    /// Whether the transcript carries no words at all.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Lifecycle state of a remote transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    /// A state this client does not know; treated as still running.
    Other(String),
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "error" => JobStatus::Error,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Snapshot of a remote transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptJob {
    pub id: String,
    pub status: JobStatus,
    /// Transcript text, once available.
    pub text: Option<String>,
    /// Service-provided failure message for `error` jobs.
    pub error: Option<String>,
}

impl TranscriptJob {
    /// Read a job from the service's JSON, tolerating missing fields.
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            status: value
                .get("status")
                .and_then(Value::as_str)
                .map(JobStatus::from)
                .unwrap_or_else(|| JobStatus::Other("unknown".to_string())),
            text: extract_text(value),
            error: value.get("error").and_then(Value::as_str).map(str::to_string),
        }
    }
}

/// Extract transcript text from a service response of unknown shape.
///
/// Tries the `text` field, then the joined `utterances` and `words` texts,
/// then the value itself when it is a bare string.
pub fn extract_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return Some(text.to_string());
        }
    }

    for key in ["utterances", "words"] {
        if let Some(items) = value.get(key).and_then(Value::as_array) {
            let joined = items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
    }

    value.as_str().map(str::to_string)
}
