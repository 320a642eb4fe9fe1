//! Server-side sessions correlated to the client through a single cookie.
//!
//! Storage, cookie handling and id rotation come from tower-sessions; this
//! module only fixes the cookie's shape and wires up the Postgres store.

use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;
use tower_sessions::{cookie::SameSite, ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{info, warn};

use crate::config::SessionConfig;

pub use tower_sessions::Session;

pub const COOKIE_NAME: &str = "session";
const CLEANUP_EVERY: Duration = Duration::from_secs(5 * 60);

/// Session layer over `store`. The lifetime restarts whenever the session is
/// written.
pub fn layer<S>(store: S, config: &SessionConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(COOKIE_NAME)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.secure_cookie)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            config.lifetime_hours,
        )))
}

/// Postgres store with its table in place and a background task deleting
/// expired rows.
pub async fn postgres_store(db: PgPool) -> anyhow::Result<PostgresStore> {
    let store = PostgresStore::new(db);
    store.migrate().await.context("migrate session store")?;

    let reaper = store.clone();
    tokio::spawn(async move {
        if let Err(e) = reaper.continuously_delete_expired(CLEANUP_EVERY).await {
            warn!(error = %e, "session cleanup stopped");
        }
    });
    info!(every = ?CLEANUP_EVERY, "session store ready");
    Ok(store)
}
