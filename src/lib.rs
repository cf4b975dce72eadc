//! Skriv - video to article
//!
//! Turns a video link into a written article and stores it for the user who
//! asked for it.
//!
//! # Overview
//!
//! A run goes through four stages, strictly in order:
//!
//! 1. Title lookup (`title`) through yt-dlp or oEmbed
//! 2. Transcription (`transcription`), either by downloading the audio and
//!    uploading it, or by handing the link straight to the speech-to-text
//!    service
//! 3. Summarization (`summarize`) with a hosted model, falling back to a
//!    chunked local model
//! 4. Persistence (`store`)
//!
//! The first failing stage ends the run and is reported by name.
//!
//! # Example
//!
//! ```rust,no_run
//! use skriv::config::Settings;
//! use skriv::pipeline::{Pipeline, PipelineOutcome, TranscriptRequest};
//! use skriv::store::{SqliteArticleStore, UserId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let store = Arc::new(SqliteArticleStore::new(&settings.sqlite_path())?);
//!     let pipeline = Pipeline::from_settings(&settings, store)?;
//!
//!     let request = TranscriptRequest::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
//!     match pipeline.run(&request, &UserId::new("alice")).await {
//!         PipelineOutcome::Success(article) => println!("{}", article.body),
//!         PipelineOutcome::Failure(failure) => eprintln!("{}", failure),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod link;
pub mod pipeline;
pub mod retry;
pub mod server;
pub mod store;
pub mod summarize;
pub mod title;
pub mod transcription;

pub use error::{Result, SkrivError};
