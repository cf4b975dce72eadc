//! Download-then-transcribe acquisition strategy.

use super::{wait_for_completion, SpeechToText, Transcript, TranscriptAcquirer};
use crate::audio::{download_audio, DownloadOptions, ScratchDir};
use crate::config::AcquisitionStrategy;
use crate::error::Result;
use crate::link::VideoLink;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Downloads the audio locally, uploads it, and waits for the transcript.
pub struct DownloadAcquirer {
    stt: Arc<dyn SpeechToText>,
    scratch_root: PathBuf,
    options: DownloadOptions,
    poll: RetryPolicy,
}

impl DownloadAcquirer {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        scratch_root: PathBuf,
        options: DownloadOptions,
        poll: RetryPolicy,
    ) -> Self {
        Self {
            stt,
            scratch_root,
            options,
            poll,
        }
    }
}

#[async_trait]
impl TranscriptAcquirer for DownloadAcquirer {
    fn strategy(&self) -> AcquisitionStrategy {
        AcquisitionStrategy::Download
    }

    #[instrument(skip(self), fields(link = %link))]
    async fn acquire_transcript(&self, link: &VideoLink) -> Result<Transcript> {
        self.stt.ensure_configured()?;

        let scratch = ScratchDir::create(&self.scratch_root)?;
        info!(request_id = %scratch.request_id(), "Acquiring audio");

        let audio_path = download_audio(link, scratch.path(), &self.options).await?;
        let size = std::fs::metadata(&audio_path)?.len();
        info!("Transcribing {:?} ({} bytes) with {}", audio_path, size, self.stt.name());

        let upload_url = self.stt.upload(&audio_path).await?;
        let job_id = self.stt.submit(&upload_url).await?;
        let text = wait_for_completion(self.stt.as_ref(), &job_id, &self.poll).await?;

        info!("Transcription finished: {} characters", text.chars().count());
        Ok(Transcript::new(text, link.as_str()))
    }
}
