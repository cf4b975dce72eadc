//! Generate command: run the pipeline once from the terminal.

use crate::cli::{preflight, Output, ProviderOverrides};
use crate::config::Settings;
use crate::pipeline::{Pipeline, PipelineOutcome, TranscriptRequest};
use crate::store::{SqliteArticleStore, UserId};
use anyhow::Result;
use std::sync::Arc;

/// Run the generate command.
pub async fn run_generate(
    link: &str,
    user: &str,
    overrides: ProviderOverrides,
    mut settings: Settings,
) -> Result<()> {
    overrides.apply(&mut settings);

    if let Err(e) = preflight::check(&settings) {
        Output::error(&e.to_string());
        Output::info("Run 'skriv doctor' for details.");
        return Err(e.into());
    }

    let store = Arc::new(SqliteArticleStore::new(&settings.sqlite_path())?);
    let pipeline = Pipeline::from_settings(&settings, store)?;

    let spinner = Output::spinner(&format!("Generating article for {}", link));
    let outcome = pipeline
        .run(&TranscriptRequest::new(link), &UserId::new(user))
        .await;
    spinner.finish_and_clear();

    match outcome {
        PipelineOutcome::Success(article) => {
            Output::header(&article.title);
            println!();
            println!("{}", article.body);
            println!();
            Output::kv("Article ID", &article.id.to_string());
            Output::kv("Source", &article.source_link);
            Ok(())
        }
        PipelineOutcome::Failure(failure) => {
            Output::error(&failure.message());
            Output::kv("Stage", &failure.stage.to_string());
            Output::kv("Reason", &failure.reason);
            Err(anyhow::anyhow!("{}", failure))
        }
    }
}
