//! SQLite-backed article store.

use super::{ArticleStore, GeneratedArticle, NewArticle, UserId};
use crate::error::{Result, SkrivError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        title TEXT NOT NULL,
        source_link TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_articles_owner ON articles(owner_id, created_at);
"#;

/// SQLite article store.
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
}

impl SqliteArticleStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite article store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SkrivError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn row_to_article(row: &Row<'_>) -> rusqlite::Result<GeneratedArticle> {
        let id: String = row.get(0)?;
        let owner: String = row.get(1)?;
        let created_at: String = row.get(5)?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        Ok(GeneratedArticle {
            id,
            owner_id: UserId::new(owner),
            title: row.get(2)?,
            source_link: row.get(3)?,
            body: row.get(4)?,
            created_at,
        })
    }
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    #[instrument(skip(self, article), fields(owner = %article.owner_id))]
    async fn create(&self, article: NewArticle) -> Result<GeneratedArticle> {
        let article = GeneratedArticle::from_new(article);
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO articles (id, owner_id, title, source_link, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                article.id.to_string(),
                article.owner_id.as_str(),
                article.title,
                article.source_link,
                article.body,
                article.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;

        debug!("Saved article {}", article.id);
        Ok(article)
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<GeneratedArticle>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_id, title, source_link, body, created_at
            FROM articles
            WHERE owner_id = ?1
            ORDER BY created_at DESC
            "#,
        )?;

        let articles = stmt
            .query_map(params![owner.as_str()], Self::row_to_article)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(articles)
    }

    async fn get(&self, id: Uuid) -> Result<Option<GeneratedArticle>> {
        let conn = self.lock()?;
        let article = conn
            .query_row(
                r#"
                SELECT id, owner_id, title, source_link, body, created_at
                FROM articles WHERE id = ?1
                "#,
                params![id.to_string()],
                Self::row_to_article,
            )
            .optional()?;
        Ok(article)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteArticleStore::in_memory().unwrap();
        crate::store::testing::exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_articles_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("articles.db");

        let id = {
            let store = SqliteArticleStore::new(&path).unwrap();
            store
                .create(NewArticle {
                    owner_id: UserId::new("alice"),
                    title: "Sample Video".into(),
                    source_link: "https://example.com/v/abc".into(),
                    body: "Hello World Summary".into(),
                })
                .await
                .unwrap()
                .id
        };

        let reopened = SqliteArticleStore::new(&path).unwrap();
        let article = reopened.get(id).await.unwrap().unwrap();
        assert_eq!(article.title, "Sample Video");
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_rows_are_reported() {
        let store = SqliteArticleStore::in_memory().unwrap();
        let valid_id = Uuid::new_v4();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO articles VALUES (?1, 'alice', 't', 'l', 'b', 'yesterday')",
                params![valid_id.to_string()],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO articles VALUES ('not-a-uuid', 'bob', 't', 'l', 'b', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        }

        assert!(matches!(store.get(valid_id).await, Err(SkrivError::Database(_))));
        assert!(matches!(
            store.list_for_owner(&UserId::new("alice")).await,
            Err(SkrivError::Database(_))
        ));
        assert!(matches!(
            store.list_for_owner(&UserId::new("bob")).await,
            Err(SkrivError::Database(_))
        ));
    }
}
