use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::auth::{
    password::{check_credentials, hash_password},
    repo::UserStore,
    repo_types::{User, UserError},
};

/// In-memory stand-in for [`PgUserStore`](super::repo::PgUserStore).
#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    /// Alice (id 1, "pa$$word") plus an account holding dupe@example.com.
    pub fn seeded() -> Self {
        let hash = hash_password("pa$$word").expect("hash seed password");
        let now = OffsetDateTime::now_utc();
        let rows = vec![
            User {
                id: 1,
                name: "Alice Jones".into(),
                email: "alice@example.com".into(),
                hashed_password: hash.clone(),
                created: now,
            },
            User {
                id: 2,
                name: "Dupe".into(),
                email: "dupe@example.com".into(),
                hashed_password: hash,
                created: now,
            },
        ];
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn remove(&self, id: i64) {
        self.rows.write().await.retain(|u| u.id != id);
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| u.email == email) {
            return Err(UserError::DuplicateEmail);
        }
        let id = rows.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        rows.push(User {
            id,
            name: name.into(),
            email: email.into(),
            hashed_password: hash_password(password)?,
            created: OffsetDateTime::now_utc(),
        });
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError> {
        let rows = self.rows.read().await;
        let user = rows.iter().find(|u| u.email == email);
        check_credentials(password, user.map(|u| u.hashed_password.as_str()))?;
        user.map(|u| u.id).ok_or(UserError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool, UserError> {
        Ok(self.rows.read().await.iter().any(|u| u.id == id))
    }
}
