//! Direct-URL acquisition strategy.

use super::{wait_for_completion, SpeechToText, Transcript, TranscriptAcquirer};
use crate::config::AcquisitionStrategy;
use crate::error::Result;
use crate::link::VideoLink;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Submits the video link itself as the audio source; nothing is downloaded.
pub struct DirectUrlAcquirer {
    stt: Arc<dyn SpeechToText>,
    poll: RetryPolicy,
}

impl DirectUrlAcquirer {
    pub fn new(stt: Arc<dyn SpeechToText>, poll: RetryPolicy) -> Self {
        Self { stt, poll }
    }
}

#[async_trait]
impl TranscriptAcquirer for DirectUrlAcquirer {
    fn strategy(&self) -> AcquisitionStrategy {
        AcquisitionStrategy::DirectUrl
    }

    #[instrument(skip(self), fields(link = %link))]
    async fn acquire_transcript(&self, link: &VideoLink) -> Result<Transcript> {
        self.stt.ensure_configured()?;

        let job_id = self.stt.submit(link.as_str()).await?;
        info!("Submitted {} to {} as job {}", link, self.stt.name(), job_id);

        let text = wait_for_completion(self.stt.as_ref(), &job_id, &self.poll).await?;
        Ok(Transcript::new(text, link.as_str()))
    }
}
