use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Snippet record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    /// No row with that id, or the row has expired.
    #[error("no matching record found")]
    NoRecord,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
