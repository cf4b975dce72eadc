//! In-memory article store.
//!
//! Useful for testing and for running the server without a database.

use super::{ArticleStore, GeneratedArticle, NewArticle, UserId};
use crate::error::{Result, SkrivError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory article store.
pub struct MemoryArticleStore {
    articles: RwLock<HashMap<Uuid, GeneratedArticle>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            articles: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> SkrivError {
    SkrivError::Store(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create(&self, article: NewArticle) -> Result<GeneratedArticle> {
        let article = GeneratedArticle::from_new(article);
        self.articles
            .write()
            .map_err(poisoned)?
            .insert(article.id, article.clone());
        Ok(article)
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<GeneratedArticle>> {
        let articles = self.articles.read().map_err(poisoned)?;
        let mut owned: Vec<GeneratedArticle> = articles
            .values()
            .filter(|a| &a.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get(&self, id: Uuid) -> Result<Option<GeneratedArticle>> {
        Ok(self.articles.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.articles.read().map_err(poisoned)?.len())
    }
}
