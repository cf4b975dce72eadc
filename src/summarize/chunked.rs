//! Chunked summarization against a local inference server.
//!
//! The transcript is cut into fixed-size character chunks, each chunk is
//! summarized independently, and the partial summaries are joined in order.

use super::{first_candidate_text, SummaryStrategy};
use crate::error::{Result, SkrivError};
use crate::http::check_status;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Length bounds for each chunk summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub min_length: u32,
    pub max_length: u32,
}

/// A model that summarizes a single chunk of text.
#[async_trait]
pub trait ChunkModel: Send + Sync {
    async fn summarize_chunk(&self, chunk: &str, params: ChunkParams) -> Result<String>;
}

/// Summarization pipeline served over HTTP on the local machine.
///
/// Speaks the Hugging Face pipeline payload, so a text-generation-inference
/// or transformers server hosting a summarization model can be used as-is.
pub struct LocalInferenceModel {
    http: reqwest::Client,
    endpoint: String,
}

impl LocalInferenceModel {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl ChunkModel for LocalInferenceModel {
    async fn summarize_chunk(&self, chunk: &str, params: ChunkParams) -> Result<String> {
        let body = json!({
            "inputs": chunk,
            "parameters": {
                "min_length": params.min_length,
                "max_length": params.max_length,
                "do_sample": false,
            }
        });

        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let value: serde_json::Value = check_status("local summarizer", response).await?.json().await?;

        first_candidate_text(&value)
            .ok_or_else(|| SkrivError::Summarization("Local summarizer returned no text".into()))
    }
}

/// Fallback strategy: summarize each chunk and join the results.
pub struct ChunkedStrategy {
    model: Arc<dyn ChunkModel>,
    chunk_size: usize,
    params: ChunkParams,
}

impl ChunkedStrategy {
    pub fn new(model: Arc<dyn ChunkModel>, chunk_size: usize, params: ChunkParams) -> Self {
        Self {
            model,
            chunk_size: chunk_size.max(1),
            params,
        }
    }
}

#[async_trait]
impl SummaryStrategy for ChunkedStrategy {
    fn name(&self) -> &str {
        "chunked-local"
    }

    #[instrument(skip_all, fields(chunk_size = self.chunk_size))]
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let chunks = split_chunks(transcript, self.chunk_size);
        debug!("Summarizing {} chunks", chunks.len());

        let mut summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            match self.model.summarize_chunk(chunk, self.params).await {
                Ok(text) if !text.trim().is_empty() => summaries.push(text.trim().to_string()),
                Ok(_) => warn!("Chunk {} produced an empty summary, skipping", i + 1),
                Err(e) => warn!("Chunk {} failed: {}, skipping", i + 1, e),
            }
        }

        if summaries.is_empty() {
            return Err(SkrivError::Summarization(format!(
                "None of {} chunks could be summarized",
                chunks.len()
            )));
        }

        Ok(summaries.join("\n\n"))
    }
}

/// Split `text` into contiguous chunks of at most `size` characters.
///
/// Concatenating the chunks reproduces the input exactly.
pub fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}
