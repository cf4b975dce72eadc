//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{ArticleStore, SqliteArticleStore, UserId};
use anyhow::Result;

/// Run the list command.
pub async fn run_list(user: &str, settings: Settings) -> Result<()> {
    let store = SqliteArticleStore::new(&settings.sqlite_path())?;

    match store.list_for_owner(&UserId::new(user)).await {
        Ok(articles) => {
            if articles.is_empty() {
                Output::info(&format!(
                    "No articles for '{}' yet. Use 'skriv generate <link> --user {}' to create one.",
                    user, user
                ));
            } else {
                Output::header(&format!("Articles for {} ({})", user, articles.len()));
                println!();

                for article in &articles {
                    Output::article_info(
                        &article.title,
                        &article.id.to_string(),
                        &article.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        &article.body,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list articles: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
