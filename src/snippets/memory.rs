use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::snippets::{
    repo::{SnippetStore, LATEST_LIMIT},
    repo_types::{Snippet, SnippetError},
};

/// In-memory stand-in for [`PgSnippetStore`](super::repo::PgSnippetStore).
#[derive(Default)]
pub struct MemorySnippetStore {
    rows: RwLock<Vec<Snippet>>,
}

impl MemorySnippetStore {
    /// Store seeded with snippet 1, "An old silent pond".
    pub fn seeded() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            rows: RwLock::new(vec![Snippet {
                id: 1,
                title: "An old silent pond".into(),
                content: "An old silent pond...".into(),
                created: now,
                expires: now + Duration::days(365),
            }]),
        }
    }

    /// Push a row as-is, bypassing the expiry computation.
    pub async fn push_raw(&self, title: &str, created: OffsetDateTime, expires: OffsetDateTime) -> i64 {
        let mut rows = self.rows.write().await;
        let id = rows.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        rows.push(Snippet {
            id,
            title: title.into(),
            content: format!("{title} content"),
            created,
            expires,
        });
        id
    }
}

#[async_trait]
impl SnippetStore for MemorySnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, SnippetError> {
        let now = OffsetDateTime::now_utc();
        let mut rows = self.rows.write().await;
        let id = rows.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        rows.push(Snippet {
            id,
            title: title.into(),
            content: content.into(),
            created: now,
            expires: now + Duration::days(expires_days.into()),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        let now = OffsetDateTime::now_utc();
        self.rows
            .read()
            .await
            .iter()
            .find(|s| s.id == id && s.expires > now)
            .cloned()
            .ok_or(SnippetError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError> {
        let now = OffsetDateTime::now_utc();
        let mut live: Vec<Snippet> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|s| s.expires > now)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.id.cmp(&a.id));
        live.truncate(LATEST_LIMIT as usize);
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_snippet_reads_as_missing() {
        let store = MemorySnippetStore::default();
        let now = OffsetDateTime::now_utc();
        let id = store
            .push_raw("stale", now - Duration::days(2), now - Duration::seconds(1))
            .await;

        assert!(matches!(store.get(id).await, Err(SnippetError::NoRecord)));
        assert!(store.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_returns_ten_newest_live_rows() {
        let store = MemorySnippetStore::default();
        let now = OffsetDateTime::now_utc();
        for i in 0..12 {
            store.insert(&format!("s{i}"), "body", 7).await.unwrap();
        }
        store
            .push_raw("expired", now - Duration::days(8), now - Duration::days(1))
            .await;

        let latest = store.latest().await.unwrap();
        assert_eq!(latest.len(), 10);
        assert!(latest.iter().all(|s| s.expires > now));
        assert!(latest.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(latest[0].title, "s11");
    }
}
