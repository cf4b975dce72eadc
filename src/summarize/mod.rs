//! Article generation from transcripts.
//!
//! The summarizer is an ordered list of strategies tried in sequence: the
//! hosted model first, then the chunked local model. The first strategy that
//! produces non-blank text wins, and its name is reported with the result.

mod chunked;
mod hosted;

pub use chunked::{split_chunks, ChunkModel, ChunkParams, ChunkedStrategy, LocalInferenceModel};
pub use hosted::{HostedModel, HostedStrategy, HuggingFaceModel, OpenAIChatModel};

use crate::config::{HostedProvider, Settings};
use crate::error::{Result, SkrivError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// One way of turning a transcript into article text.
#[async_trait]
pub trait SummaryStrategy: Send + Sync {
    /// Name reported when this strategy produced the article.
    fn name(&self) -> &str;

    /// Generate the article body.
    async fn summarize(&self, transcript: &str) -> Result<String>;
}

/// Generated article text and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub body: String,
    pub strategy: String,
}

/// Ordered fallback chain of summary strategies.
#[derive(Clone)]
pub struct Summarizer {
    strategies: Vec<Arc<dyn SummaryStrategy>>,
}

impl Summarizer {
    pub fn new(strategies: Vec<Arc<dyn SummaryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the chain described by the settings.
    pub fn from_settings(settings: &Settings, http: reqwest::Client, timeout: Duration) -> Self {
        let s = &settings.summarizer;

        let hosted: Arc<dyn HostedModel> = match s.provider {
            HostedProvider::HuggingFace => Arc::new(HuggingFaceModel::new(
                http.clone(),
                &s.huggingface_base_url,
                &s.model,
                s.temperature,
                s.max_new_tokens,
            )),
            HostedProvider::OpenAI => Arc::new(OpenAIChatModel::new(
                &s.model,
                s.temperature,
                s.max_new_tokens,
                timeout,
            )),
        };

        let mut strategies: Vec<Arc<dyn SummaryStrategy>> =
            vec![Arc::new(HostedStrategy::new(hosted, &s.prompt))];

        if s.fallback_enabled {
            let local = Arc::new(LocalInferenceModel::new(http, &s.local_endpoint));
            strategies.push(Arc::new(ChunkedStrategy::new(
                local,
                s.chunk_size,
                ChunkParams {
                    min_length: s.min_length,
                    max_length: s.max_length,
                },
            )));
        }

        Self::new(strategies)
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Try each strategy in order; fail only when all of them fail.
    #[instrument(skip_all, fields(transcript_chars = transcript.chars().count()))]
    pub async fn summarize(&self, transcript: &str) -> Result<Summary> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.summarize(transcript).await {
                Ok(body) if !body.trim().is_empty() => {
                    info!("Article generated by '{}' ({} characters)", strategy.name(), body.len());
                    return Ok(Summary {
                        body,
                        strategy: strategy.name().to_string(),
                    });
                }
                Ok(_) => {
                    warn!("Strategy '{}' produced no text, trying next", strategy.name());
                    failures.push(format!("{}: empty output", strategy.name()));
                }
                Err(e) => {
                    warn!("Strategy '{}' failed: {}, trying next", strategy.name(), e);
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no strategies configured".to_string());
        }
        Err(SkrivError::Summarization(failures.join("; ")))
    }
}

/// Text of the first candidate in a pipeline-style model response.
///
/// Accepts `[{"summary_text": ..}]`, `[{"generated_text": ..}]`, or the same
/// objects unwrapped.
pub(crate) fn first_candidate_text(value: &Value) -> Option<String> {
    let candidate = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };

    ["summary_text", "generated_text"]
        .iter()
        .find_map(|key| candidate.get(key).and_then(Value::as_str))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
