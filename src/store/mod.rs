//! Persistence of generated articles.
//!
//! Articles are owned by the user that requested them and are only ever
//! listed or fetched on behalf of that owner.

mod memory;
mod sqlite;

pub use memory::MemoryArticleStore;
pub use sqlite::SqliteArticleStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields supplied when saving an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub owner_id: UserId,
    pub title: String,
    pub source_link: String,
    pub body: String,
}

/// A persisted article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    /// Unique article ID.
    pub id: Uuid,
    /// User that requested the article.
    pub owner_id: UserId,
    /// Title of the source video.
    pub title: String,
    /// Link of the source video.
    pub source_link: String,
    /// Article text.
    pub body: String,
    /// When the article was saved.
    pub created_at: DateTime<Utc>,
}

impl GeneratedArticle {
    /// Assign an id and creation time to a new article.
    pub fn from_new(article: NewArticle) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: article.owner_id,
            title: article.title,
            source_link: article.source_link,
            body: article.body,
            created_at: Utc::now(),
        }
    }
}

/// Storage backend for generated articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Save an article, returning the stored record.
    async fn create(&self, article: NewArticle) -> Result<GeneratedArticle>;

    /// All articles owned by `owner`, newest first.
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<GeneratedArticle>>;

    /// A single article by id, regardless of owner.
    async fn get(&self, id: Uuid) -> Result<Option<GeneratedArticle>>;

    /// A single article by id, only if `owner` owns it.
    async fn get_for_owner(&self, id: Uuid, owner: &UserId) -> Result<Option<GeneratedArticle>> {
        Ok(self.get(id).await?.filter(|a| &a.owner_id == owner))
    }

    /// Number of stored articles.
    async fn count(&self) -> Result<usize>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Shared behavior checks run against every backend.
    pub async fn exercise_store(store: &dyn ArticleStore) {
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_for_owner(&alice).await.unwrap().is_empty());

        let first = store
            .create(NewArticle {
                owner_id: alice.clone(),
                title: "Sample Video".into(),
                source_link: "https://example.com/v/abc".into(),
                body: "Hello World Summary".into(),
            })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store
            .create(NewArticle {
                owner_id: alice.clone(),
                title: "Second Video".into(),
                source_link: "https://example.com/v/def".into(),
                body: "Another article".into(),
            })
            .await
            .unwrap();
        let other = store
            .create(NewArticle {
                owner_id: bob.clone(),
                title: "Bob's Video".into(),
                source_link: "https://example.com/v/ghi".into(),
                body: "Bob's article".into(),
            })
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 3);

        let listed = store.list_for_owner(&alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1], first);

        let fetched = store.get(first.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Sample Video");
        assert_eq!(fetched.owner_id, alice);
        assert_eq!(fetched.body, "Hello World Summary");

        assert!(store.get_for_owner(other.id, &alice).await.unwrap().is_none());
        assert!(store.get_for_owner(other.id, &bob).await.unwrap().is_some());
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
