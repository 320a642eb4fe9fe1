use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{
    password::{check_credentials, hash_password},
    repo_types::{User, UserError},
};

const EMAIL_CONSTRAINT: &str = "users_uc_email";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user, hashing the plaintext password first.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError>;
    /// Id of the user owning these credentials.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError>;
    /// Whether a user with this id exists. Absence is `Ok(false)`.
    async fn exists(&self, id: i64) -> Result<bool, UserError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_duplicate_email(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError> {
        let hash = hash_password(password)?;
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, now())
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hash)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(id) => Ok(id),
            Err(e) if is_duplicate_email(&e) => Err(UserError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, hashed_password, created
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        check_credentials(password, user.as_ref().map(|u| u.hashed_password.as_str()))?;
        user.map(|u| u.id).ok_or(UserError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool, UserError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT true FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }
}
