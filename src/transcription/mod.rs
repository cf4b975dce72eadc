//! Transcript acquisition for Skriv.
//!
//! A transcript is obtained with one of two interchangeable strategies:
//!
//! - **Download**: fetch the audio locally with yt-dlp, upload it to the
//!   speech-to-text service, and wait for the job.
//! - **Direct URL**: hand the video link to the service as the audio source
//!   and wait for the job.
//!
//! Both poll the service with a bounded number of status checks and
//! exponential backoff between them.

mod assemblyai;
mod direct;
mod download;
mod models;

pub use assemblyai::AssemblyAiClient;
pub use direct::DirectUrlAcquirer;
pub use download::DownloadAcquirer;
pub use models::{extract_text, JobStatus, Transcript, TranscriptJob};

use crate::audio::DownloadOptions;
use crate::config::{AcquisitionStrategy, Settings};
use crate::error::{Result, SkrivError};
use crate::link::VideoLink;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Obtains a transcript for a video link.
#[async_trait]
pub trait TranscriptAcquirer: Send + Sync {
    /// Strategy implemented by this acquirer.
    fn strategy(&self) -> AcquisitionStrategy;

    /// Produce the transcript. Blank text is returned as-is; callers decide
    /// whether it is usable.
    async fn acquire_transcript(&self, link: &VideoLink) -> Result<Transcript>;
}

/// A remote speech-to-text service with create/poll/get-by-id semantics.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Service name, for logs.
    fn name(&self) -> &str;

    /// Fail early when credentials are missing.
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// Upload a local audio file, returning a URL the service can read.
    async fn upload(&self, audio_path: &Path) -> Result<String>;

    /// Create a transcription job for `audio_url`, returning its id.
    async fn submit(&self, audio_url: &str) -> Result<String>;

    /// Fetch the current state of a job.
    async fn fetch(&self, job_id: &str) -> Result<TranscriptJob>;
}

/// Why the transcription stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionFailure {
    /// A required secret or setting is absent.
    MissingConfig,
    /// The audio could not be downloaded or located.
    DownloadFailed,
    /// The speech-to-text service failed or never finished.
    ServiceError,
    /// The service finished but produced no words.
    EmptyResult,
}

impl TranscriptionFailure {
    /// Classify an error raised inside the transcription stage.
    pub fn classify(error: &SkrivError) -> Self {
        match error {
            SkrivError::MissingSecret { .. } | SkrivError::Config(_) => Self::MissingConfig,
            SkrivError::AudioDownload(_)
            | SkrivError::ToolNotFound(_)
            | SkrivError::ToolFailed(_) => Self::DownloadFailed,
            _ => Self::ServiceError,
        }
    }
}

impl std::fmt::Display for TranscriptionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingConfig => write!(f, "missing configuration"),
            Self::DownloadFailed => write!(f, "audio download failed"),
            Self::ServiceError => write!(f, "transcription service error"),
            Self::EmptyResult => write!(f, "empty transcript"),
        }
    }
}

/// Poll a job until it reaches a terminal state or checks run out.
///
/// Transient errors while fetching the status count as a used check and are
/// otherwise ignored; any other error ends the wait.
pub async fn wait_for_completion(
    stt: &dyn SpeechToText,
    job_id: &str,
    poll: &RetryPolicy,
) -> Result<String> {
    for attempt in 1..=poll.max_attempts {
        match stt.fetch(job_id).await {
            Ok(job) => match job.status {
                JobStatus::Completed => {
                    info!("{} job {} completed", stt.name(), job_id);
                    return Ok(job.text.unwrap_or_default());
                }
                JobStatus::Error => {
                    let reason = job.error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(SkrivError::Transcription(format!(
                        "{} job {} failed: {}",
                        stt.name(),
                        job_id,
                        reason
                    )));
                }
                status => debug!("Job {} is {} (check {}/{})", job_id, status, attempt, poll.max_attempts),
            },
            Err(e) if e.is_transient() => {
                warn!("Status check {} for job {} failed: {}", attempt, job_id, e);
            }
            Err(e) => return Err(e),
        }

        if attempt < poll.max_attempts {
            tokio::time::sleep(poll.delay_for(attempt)).await;
        }
    }

    Err(SkrivError::Transcription(format!(
        "{} job {} did not finish after {} status checks (timed out)",
        stt.name(),
        job_id,
        poll.max_attempts
    )))
}

/// Polling policy from the transcription settings.
pub fn poll_policy(settings: &Settings) -> RetryPolicy {
    RetryPolicy::new(
        settings.transcription.poll_max_attempts,
        Duration::from_millis(settings.transcription.poll_initial_delay_ms),
        Duration::from_millis(settings.transcription.poll_max_delay_ms),
    )
}

/// Build the acquirer selected in the settings.
pub fn create_acquirer(settings: &Settings, http: reqwest::Client) -> Arc<dyn TranscriptAcquirer> {
    let stt: Arc<dyn SpeechToText> = Arc::new(AssemblyAiClient::new(
        http,
        &settings.transcription.api_base_url,
    ));
    let poll = poll_policy(settings);

    match settings.transcription.strategy {
        AcquisitionStrategy::Download => {
            let options = DownloadOptions {
                audio_format: settings.transcription.audio_format.clone(),
                audio_quality: settings.transcription.audio_quality.clone(),
                ..DownloadOptions::default()
            };
            Arc::new(DownloadAcquirer::new(stt, settings.scratch_dir(), options, poll))
        }
        AcquisitionStrategy::DirectUrl => Arc::new(DirectUrlAcquirer::new(stt, poll)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted speech-to-text service.
    pub struct ScriptedStt {
        pub configured: bool,
        pub statuses: Mutex<Vec<Result<TranscriptJob>>>,
        pub submitted: Mutex<Vec<String>>,
        pub fetches: AtomicUsize,
    }

    impl ScriptedStt {
        pub fn new(statuses: Vec<Result<TranscriptJob>>) -> Self {
            Self {
                configured: true,
                statuses: Mutex::new(statuses),
                submitted: Mutex::new(Vec::new()),
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::new(Vec::new())
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    pub fn job(status: &str, text: Option<&str>) -> TranscriptJob {
        TranscriptJob {
            id: "job-1".to_string(),
            status: JobStatus::from(status),
            text: text.map(str::to_string),
            error: None,
        }
    }

    #[async_trait]
    impl SpeechToText for ScriptedStt {
        fn name(&self) -> &str {
            "scripted"
        }

        fn ensure_configured(&self) -> Result<()> {
            if self.configured {
                Ok(())
            } else {
                Err(crate::config::secrets::ASSEMBLYAI_API_KEY.missing())
            }
        }

        async fn upload(&self, _audio_path: &Path) -> Result<String> {
            Ok("https://cdn.example.com/upload/1".to_string())
        }

        async fn submit(&self, audio_url: &str) -> Result<String> {
            self.submitted.lock().unwrap().push(audio_url.to_string());
            Ok("job-1".to_string())
        }

        async fn fetch(&self, _job_id: &str) -> Result<TranscriptJob> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.is_empty() {
                Ok(job("processing", None))
            } else {
                statuses.remove(0)
            }
        }
    }

    pub fn fast_poll(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }
}
