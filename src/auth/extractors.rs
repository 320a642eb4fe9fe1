use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

/// Session key whose presence means "logged in".
pub const AUTH_USER_KEY: &str = "authenticated_user_id";

/// Request extension set once the session's user is known to exist.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub i64);

/// Extracts the authenticated user id; rejects with 401 when absent.
/// Only reachable on routes behind the require-authentication gate.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated>()
            .map(|Authenticated(id)| AuthUser(*id))
            .ok_or((StatusCode::UNAUTHORIZED, "not authenticated".to_string()))
    }
}
