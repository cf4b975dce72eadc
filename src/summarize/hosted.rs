//! Hosted text-generation models.

use super::{first_candidate_text, SummaryStrategy};
use crate::config::prompts::article_prompt;
use crate::config::secrets::{HUGGINGFACE_TOKEN, OPENAI_API_KEY};
use crate::error::{Result, SkrivError};
use crate::http::{check_status, create_openai_client};
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A remote model that completes a single prompt.
#[async_trait]
pub trait HostedModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Hugging Face Inference API text generation.
pub struct HuggingFaceModel {
    http: reqwest::Client,
    url: String,
    temperature: f32,
    max_new_tokens: u32,
}

impl HuggingFaceModel {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: &str,
        temperature: f32,
        max_new_tokens: u32,
    ) -> Self {
        Self {
            http,
            url: format!("{}/{}", base_url.trim_end_matches('/'), model),
            temperature,
            max_new_tokens,
        }
    }
}

#[async_trait]
impl HostedModel for HuggingFaceModel {
    fn name(&self) -> &str {
        "huggingface"
    }

    #[instrument(skip(self, prompt), fields(url = %self.url))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let token = HUGGINGFACE_TOKEN.require()?;

        let body = json!({
            "inputs": prompt,
            "parameters": {
                "temperature": self.temperature,
                "max_new_tokens": self.max_new_tokens,
            }
        });

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let value: serde_json::Value = check_status("Hugging Face", response).await?.json().await?;
        first_candidate_text(&value).ok_or_else(|| {
            SkrivError::Summarization("Hugging Face response contained no generated text".into())
        })
    }
}

/// OpenAI chat completion with a single user message.
pub struct OpenAIChatModel {
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAIChatModel {
    pub fn new(model: &str, temperature: f32, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            model: model.to_string(),
            temperature,
            max_tokens,
            timeout,
        }
    }
}

#[async_trait]
impl HostedModel for OpenAIChatModel {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let client = create_openai_client(&OPENAI_API_KEY.require()?, self.timeout)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| SkrivError::Summarization(e.to_string()))?
                .into()])
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens)
            .build()
            .map_err(|e| SkrivError::Summarization(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| SkrivError::OpenAI(format!("Failed to generate article: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| SkrivError::Summarization("Empty response from OpenAI".into()))
    }
}

/// Primary strategy: one instruction prompt over the whole transcript.
pub struct HostedStrategy {
    model: Arc<dyn HostedModel>,
    prompt_template: String,
    name: String,
}

impl HostedStrategy {
    pub fn new(model: Arc<dyn HostedModel>, prompt_template: &str) -> Self {
        let name = format!("hosted:{}", model.name());
        Self {
            model,
            prompt_template: prompt_template.to_string(),
            name,
        }
    }
}

#[async_trait]
impl SummaryStrategy for HostedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn summarize(&self, transcript: &str) -> Result<String> {
        let prompt = article_prompt(&self.prompt_template, transcript);
        debug!("Prompt is {} characters", prompt.len());

        let text = self.model.generate(&prompt).await?;
        if text.trim().is_empty() {
            return Err(SkrivError::Summarization(format!(
                "{} returned an empty article",
                self.model.name()
            )));
        }
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
        reply: String,
    }

    #[async_trait]
    impl HostedModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn model(reply: &str) -> Arc<RecordingModel> {
        Arc::new(RecordingModel {
            prompts: Mutex::new(Vec::new()),
            reply: reply.to_string(),
        })
    }

    #[tokio::test]
    async fn test_prompt_embeds_transcript() {
        let recording = model("  Hello World Summary\n");
        let strategy = HostedStrategy::new(
            recording.clone(),
            crate::config::prompts::DEFAULT_ARTICLE_PROMPT,
        );

        let article = strategy.summarize("hello world").await.unwrap();
        assert_eq!(article, "Hello World Summary");
        assert_eq!(strategy.name(), "hosted:recording");

        let prompts = recording.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Write a detailed, SEO-friendly blog post"));
        assert!(prompts[0].ends_with("hello world"));
    }

    #[tokio::test]
    async fn test_blank_generation_is_an_error() {
        let strategy = HostedStrategy::new(model(" \n "), "{{text}}");
        assert!(matches!(
            strategy.summarize("hello").await,
            Err(SkrivError::Summarization(_))
        ));
    }

    #[test]
    fn test_huggingface_url() {
        let hf = HuggingFaceModel::new(
            reqwest::Client::new(),
            "https://api-inference.huggingface.co/models/",
            "facebook/bart-large-cnn",
            0.5,
            500,
        );
        assert_eq!(hf.url, "https://api-inference.huggingface.co/models/facebook/bart-large-cnn");
    }
}
