//! Show command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{ArticleStore, SqliteArticleStore, UserId};
use anyhow::{Context, Result};
use uuid::Uuid;

/// Print one article owned by `user`.
pub async fn run_show(id: &str, user: &str, settings: Settings) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("'{}' is not an article ID", id))?;
    let store = SqliteArticleStore::new(&settings.sqlite_path())?;

    match store.get_for_owner(id, &UserId::new(user)).await? {
        Some(article) => {
            Output::header(&article.title);
            Output::kv("Source", &article.source_link);
            Output::kv("Created", &article.created_at.to_rfc3339());
            println!();
            println!("{}", article.body);
            Ok(())
        }
        None => {
            Output::error(&format!("Article {} not found for '{}'", id, user));
            Err(anyhow::anyhow!("article not found"))
        }
    }
}
