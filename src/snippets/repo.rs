use async_trait::async_trait;
use sqlx::PgPool;

use crate::snippets::repo_types::{Snippet, SnippetError};

/// How many snippets the home page lists.
pub const LATEST_LIMIT: i64 = 10;

#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Insert a snippet expiring `expires_days` after now; returns its id.
    async fn insert(&self, title: &str, content: &str, expires_days: i32)
        -> Result<i64, SnippetError>;
    /// Fetch a non-expired snippet.
    async fn get(&self, id: i64) -> Result<Snippet, SnippetError>;
    /// Up to [`LATEST_LIMIT`] non-expired snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError>;
}

#[derive(Clone)]
pub struct PgSnippetStore {
    db: PgPool,
}

impl PgSnippetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, SnippetError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, now(), now() + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > now() AND id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(SnippetError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError> {
        let rows = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > now()
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(LATEST_LIMIT)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
