//! The link-to-article pipeline.
//!
//! Stages run strictly in order (title lookup, transcription, summarization,
//! persistence) and the first failure ends the run. The outcome names the
//! stage that failed so callers can report it precisely.

use crate::config::{PipelineSettings, Settings};
use crate::error::{Result, SkrivError};
use crate::http::create_client;
use crate::link::VideoLink;
use crate::retry::{retry, with_timeout, RetryPolicy};
use crate::store::{ArticleStore, GeneratedArticle, NewArticle, UserId};
use crate::summarize::Summarizer;
use crate::title::{create_resolver, TitleResolver};
use crate::transcription::{create_acquirer, poll_policy, TranscriptAcquirer, TranscriptionFailure};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// A request to turn one video into an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRequest {
    pub video_link: String,
}

impl TranscriptRequest {
    pub fn new(video_link: impl Into<String>) -> Self {
        Self {
            video_link: video_link.into(),
        }
    }
}

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TitleLookup,
    Transcription,
    Summarization,
    Persistence,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::TitleLookup => write!(f, "title_lookup"),
            Stage::Transcription => write!(f, "transcription"),
            Stage::Summarization => write!(f, "summarization"),
            Stage::Persistence => write!(f, "persistence"),
        }
    }
}

/// Why and where a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
    /// Set for transcription failures.
    pub transcription: Option<TranscriptionFailure>,
}

impl StageFailure {
    fn new(stage: Stage, error: &SkrivError) -> Self {
        Self {
            stage,
            reason: error.to_string(),
            transcription: None,
        }
    }

    fn transcription(kind: TranscriptionFailure, reason: String) -> Self {
        Self {
            stage: Stage::Transcription,
            reason,
            transcription: Some(kind),
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        match (self.stage, self.transcription) {
            (Stage::TitleLookup, _) => "Could not retrieve the video title".to_string(),
            (Stage::Transcription, Some(kind)) => format!("Failed to get transcript: {}", kind),
            (Stage::Transcription, None) => "Failed to get transcript".to_string(),
            (Stage::Summarization, _) => "Failed to generate article".to_string(),
            (Stage::Persistence, _) => "Failed to save article".to_string(),
        }
    }
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.reason)
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Success(GeneratedArticle),
    Failure(StageFailure),
}

/// Retry and timeout limits applied to the stages.
#[derive(Debug, Clone, Copy)]
pub struct StageLimits {
    /// Retry policy for title lookup and transcription.
    pub retry: RetryPolicy,
    pub title_timeout: Duration,
    pub transcription_timeout: Duration,
    pub summarization_timeout: Duration,
}

impl StageLimits {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            retry: RetryPolicy::new(
                settings.max_attempts,
                Duration::from_millis(settings.retry_initial_delay_ms),
                Duration::from_millis(settings.retry_max_delay_ms),
            ),
            title_timeout: settings.title_timeout(),
            transcription_timeout: settings.transcription_timeout(),
            summarization_timeout: settings.summarization_timeout(),
        }
    }
}

impl Default for StageLimits {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

/// Runs link-to-article requests.
#[derive(Clone)]
pub struct Pipeline {
    title: Arc<dyn TitleResolver>,
    acquirer: Arc<dyn TranscriptAcquirer>,
    summarizer: Summarizer,
    store: Arc<dyn ArticleStore>,
    limits: StageLimits,
}

impl Pipeline {
    /// Build the pipeline described by the settings around `store`.
    pub fn from_settings(settings: &Settings, store: Arc<dyn ArticleStore>) -> Result<Self> {
        let timeout = settings.http_timeout();
        let http = create_client(timeout)?;

        let title = create_resolver(settings, http.clone());
        let acquirer = create_acquirer(settings, http.clone());
        let summarizer = Summarizer::from_settings(settings, http, timeout);

        let poll_budget = poll_policy(settings).total_delay();
        if settings.pipeline.transcription_timeout() <= poll_budget {
            warn!(
                "pipeline.transcription_timeout_secs ({:?}) does not cover the polling budget ({:?}); slow jobs will time out",
                settings.pipeline.transcription_timeout(),
                poll_budget
            );
        }

        info!(
            "Pipeline: title via {}, transcript via {}, article via [{}]",
            title.name(),
            acquirer.strategy(),
            summarizer.strategy_names().join(", ")
        );

        Ok(Self::with_components(
            title,
            acquirer,
            summarizer,
            store,
            StageLimits::from_settings(&settings.pipeline),
        ))
    }

    /// Build a pipeline from explicit components.
    pub fn with_components(
        title: Arc<dyn TitleResolver>,
        acquirer: Arc<dyn TranscriptAcquirer>,
        summarizer: Summarizer,
        store: Arc<dyn ArticleStore>,
        limits: StageLimits,
    ) -> Self {
        Self {
            title,
            acquirer,
            summarizer,
            store,
            limits,
        }
    }

    /// Store the pipeline writes to.
    pub fn store(&self) -> Arc<dyn ArticleStore> {
        self.store.clone()
    }

    /// Run the full pipeline for an authenticated `owner`.
    #[instrument(skip_all, fields(link = %request.video_link, owner = %owner))]
    pub async fn run(&self, request: &TranscriptRequest, owner: &UserId) -> PipelineOutcome {
        match self.run_stages(request, owner).await {
            Ok(article) => {
                info!("Article {} saved for {}", article.id, owner);
                PipelineOutcome::Success(article)
            }
            Err(failure) => {
                warn!("{}", failure);
                PipelineOutcome::Failure(failure)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &TranscriptRequest,
        owner: &UserId,
    ) -> std::result::Result<GeneratedArticle, StageFailure> {
        let limits = &self.limits;

        // An unusable link cannot have a title.
        let link = VideoLink::parse(&request.video_link)
            .map_err(|e| StageFailure::new(Stage::TitleLookup, &e))?;
        debug!(host = link.host(), video_id = ?link.platform_id(), "Processing link");

        let title = retry(&limits.retry, "Title lookup", || {
            with_timeout(limits.title_timeout, "Title lookup", self.title.resolve_title(&link))
        })
        .await
        .map_err(|e| StageFailure::new(Stage::TitleLookup, &e))?;
        info!("Title: {}", title);

        // The deadline covers every attempt.
        let transcript = with_timeout(
            limits.transcription_timeout,
            "Transcription",
            retry(&limits.retry, "Transcription", || self.acquirer.acquire_transcript(&link)),
        )
        .await
        .map_err(|e| {
            let kind = TranscriptionFailure::classify(&e);
            if kind == TranscriptionFailure::MissingConfig {
                error!("Transcription is not configured: {}", e);
            }
            StageFailure::transcription(kind, e.to_string())
        })?;

        if transcript.is_blank() {
            return Err(StageFailure::transcription(
                TranscriptionFailure::EmptyResult,
                "transcript is empty".to_string(),
            ));
        }
        info!("Transcript: {} characters", transcript.char_count());

        let summary = with_timeout(
            limits.summarization_timeout,
            "Summarization",
            self.summarizer.summarize(&transcript.text),
        )
        .await
        .map_err(|e| StageFailure::new(Stage::Summarization, &e))?;
        info!("Article body from '{}'", summary.strategy);

        self.store
            .create(NewArticle {
                owner_id: owner.clone(),
                title,
                source_link: link.as_str().to_string(),
                body: summary.body,
            })
            .await
            .map_err(|e| StageFailure::new(Stage::Persistence, &e))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::store::MemoryArticleStore;
    use crate::summarize::testing::FixedStrategy;
    use crate::summarize::SummaryStrategy;
    use async_trait::async_trait;

    const LINK: &str = "https://example.com/v/abc";

    fn hello_world() -> Result<String> {
        Ok("hello world".to_string())
    }

    fn pipeline(
        title: Arc<FakeTitle>,
        acquirer: Arc<FakeAcquirer>,
        strategies: Vec<Arc<dyn SummaryStrategy>>,
        store: Arc<dyn ArticleStore>,
    ) -> Pipeline {
        Pipeline::with_components(title, acquirer, Summarizer::new(strategies), store, fast_limits())
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[tokio::test]
    async fn test_end_to_end_with_fallback_summary() {
        let store = Arc::new(MemoryArticleStore::new());
        let primary = FixedStrategy::failing("hosted", "model unavailable");
        let fallback = FixedStrategy::ok("chunked", "Hello World Summary");
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            FakeAcquirer::new(hello_world),
            vec![primary.clone(), fallback.clone()],
            store.clone(),
        );

        let article = match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Success(article) => article,
            other => panic!("expected success, got {:?}", other),
        };

        assert_eq!(article.title, "Sample Video");
        assert_eq!(article.body, "Hello World Summary");
        assert_eq!(article.source_link, LINK);
        assert_eq!(article.owner_id, alice());
        assert_eq!((primary.calls(), fallback.calls()), (1, 1));

        let stored = store.list_for_owner(&alice()).await.unwrap();
        assert_eq!(stored, vec![article]);
    }

    #[tokio::test]
    async fn test_title_failure_stops_pipeline() {
        let store = Arc::new(MemoryArticleStore::new());
        let title = FakeTitle::new(None);
        let acquirer = FakeAcquirer::new(hello_world);
        let strategy = FixedStrategy::ok("hosted", "article");
        let p = pipeline(title.clone(), acquirer.clone(), vec![strategy.clone()], store.clone());

        match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Failure(f) => assert_eq!(f.stage, Stage::TitleLookup),
            other => panic!("expected title failure, got {:?}", other),
        }
        assert_eq!(title.calls(), 1);
        assert_eq!(acquirer.calls(), 0);
        assert_eq!(strategy.calls(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_link_is_a_title_failure() {
        let title = FakeTitle::new(Some("Sample Video"));
        let p = pipeline(
            title.clone(),
            FakeAcquirer::new(hello_world),
            vec![FixedStrategy::ok("hosted", "article")],
            Arc::new(MemoryArticleStore::new()),
        );

        match p.run(&TranscriptRequest::new("not a link"), &alice()).await {
            PipelineOutcome::Failure(f) => assert_eq!(f.stage, Stage::TitleLookup),
            other => panic!("expected title failure, got {:?}", other),
        }
        assert_eq!(title.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_transcript_never_reaches_summarizer() {
        let strategy = FixedStrategy::ok("hosted", "article");
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            FakeAcquirer::new(|| Ok("  \n".to_string())),
            vec![strategy.clone()],
            Arc::new(MemoryArticleStore::new()),
        );

        match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Failure(f) => {
                assert_eq!(f.stage, Stage::Transcription);
                assert_eq!(f.transcription, Some(TranscriptionFailure::EmptyResult));
            }
            other => panic!("expected transcription failure, got {:?}", other),
        }
        assert_eq!(strategy.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_config_is_not_retried() {
        let acquirer =
            FakeAcquirer::new(|| Err(crate::config::secrets::ASSEMBLYAI_API_KEY.missing()));
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            acquirer.clone(),
            vec![FixedStrategy::ok("hosted", "article")],
            Arc::new(MemoryArticleStore::new()),
        );

        match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Failure(f) => {
                assert_eq!(f.transcription, Some(TranscriptionFailure::MissingConfig));
                assert_eq!(f.message(), "Failed to get transcript: missing configuration");
            }
            other => panic!("expected transcription failure, got {:?}", other),
        }
        assert_eq!(acquirer.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_transcription_errors_are_retried() {
        let acquirer = FakeAcquirer::new(|| {
            Err(SkrivError::Service {
                service: "AssemblyAI".into(),
                status: 503,
                message: "unavailable".into(),
            })
        });
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            acquirer.clone(),
            vec![FixedStrategy::ok("hosted", "article")],
            Arc::new(MemoryArticleStore::new()),
        );

        let outcome = p.run(&TranscriptRequest::new(LINK), &alice()).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Failure(StageFailure {
                stage: Stage::Transcription,
                transcription: Some(TranscriptionFailure::ServiceError),
                ..
            })
        ));
        assert_eq!(acquirer.calls(), fast_limits().retry.max_attempts as usize);
    }

    /// Acquirer whose transcript never arrives in time.
    struct StalledAcquirer {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl TranscriptAcquirer for StalledAcquirer {
        fn strategy(&self) -> crate::config::AcquisitionStrategy {
            crate::config::AcquisitionStrategy::DirectUrl
        }

        async fn acquire_transcript(&self, _link: &VideoLink) -> Result<crate::transcription::Transcript> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(SkrivError::Transcription("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_transcription_stage_timeout_is_not_resubmitted() {
        let acquirer = Arc::new(StalledAcquirer {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let limits = StageLimits {
            transcription_timeout: Duration::from_millis(50),
            ..fast_limits()
        };
        let p = Pipeline::with_components(
            FakeTitle::new(Some("Sample Video")),
            acquirer.clone(),
            Summarizer::new(vec![FixedStrategy::ok("hosted", "article")]),
            Arc::new(MemoryArticleStore::new()),
            limits,
        );

        match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Failure(f) => {
                assert_eq!(f.stage, Stage::Transcription);
                assert!(f.reason.contains("timed out"));
            }
            other => panic!("expected transcription failure, got {:?}", other),
        }
        assert_eq!(acquirer.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_summarizers_failing_persists_nothing() {
        let store = Arc::new(MemoryArticleStore::new());
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            FakeAcquirer::new(hello_world),
            vec![
                FixedStrategy::failing("hosted", "quota"),
                FixedStrategy::failing("chunked", "no chunks"),
            ],
            store.clone(),
        );

        match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Failure(f) => assert_eq!(f.stage, Stage::Summarization),
            other => panic!("expected summarization failure, got {:?}", other),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    struct BrokenStore;

    #[async_trait]
    impl ArticleStore for BrokenStore {
        async fn create(&self, _article: NewArticle) -> Result<GeneratedArticle> {
            Err(SkrivError::Store("disk full".into()))
        }

        async fn list_for_owner(&self, _owner: &UserId) -> Result<Vec<GeneratedArticle>> {
            Ok(Vec::new())
        }

        async fn get(&self, _id: uuid::Uuid) -> Result<Option<GeneratedArticle>> {
            Ok(None)
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_as_persistence() {
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            FakeAcquirer::new(hello_world),
            vec![FixedStrategy::ok("hosted", "article")],
            Arc::new(BrokenStore),
        );

        match p.run(&TranscriptRequest::new(LINK), &alice()).await {
            PipelineOutcome::Failure(f) => {
                assert_eq!(f.stage, Stage::Persistence);
                assert!(f.reason.contains("disk full"));
            }
            other => panic!("expected persistence failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_link_resolves_same_title() {
        let store = Arc::new(MemoryArticleStore::new());
        let p = pipeline(
            FakeTitle::new(Some("Sample Video")),
            FakeAcquirer::new(hello_world),
            vec![FixedStrategy::ok("hosted", "article")],
            store.clone(),
        );

        let request = TranscriptRequest::new(LINK);
        let first = p.run(&request, &alice()).await;
        let second = p.run(&request, &alice()).await;

        match (first, second) {
            (PipelineOutcome::Success(a), PipelineOutcome::Success(b)) => {
                assert_eq!(a.title, b.title);
                assert_ne!(a.id, b.id);
            }
            other => panic!("expected two successes, got {:?}", other),
        }
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[test]
    fn test_limits_from_settings() {
        let limits = StageLimits::default();
        assert_eq!(limits.retry.max_attempts, 3);
        assert_eq!(limits.title_timeout, Duration::from_secs(30));

        let settings = Settings::default();
        assert!(limits.transcription_timeout > poll_policy(&settings).total_delay());
    }
}
