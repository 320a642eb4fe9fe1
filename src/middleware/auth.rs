use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, info, warn};

use crate::{
    auth::{
        extractors::{Authenticated, AUTH_USER_KEY},
        repo::UserStore,
    },
    error::status_response,
    middleware::Interceptor,
    session::Session,
};

pub const LOGIN_PATH: &str = "/user/login";

/// Marks the request [`Authenticated`] when the session names a user that
/// still exists; forgets the user otherwise.
pub struct Authenticate {
    users: Arc<dyn UserStore>,
}

impl Authenticate {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Interceptor for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn intercept(&self, mut req: Request, next: Next) -> Response {
        let Some(session) = req.extensions().get::<Session>().cloned() else {
            error!("authenticate running without a session");
            return status_response(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let forget = match session.get::<i64>(AUTH_USER_KEY).await {
            Ok(None) => false,
            Ok(Some(user_id)) => match self.users.exists(user_id).await {
                Ok(true) => {
                    req.extensions_mut().insert(Authenticated(user_id));
                    false
                }
                Ok(false) => {
                    info!(user_id, "session names a missing user; clearing");
                    true
                }
                Err(e) => {
                    error!(error = %e, user_id, "user lookup failed");
                    return status_response(StatusCode::INTERNAL_SERVER_ERROR);
                }
            },
            Err(e) => {
                warn!(error = %e, "unreadable session user id; clearing");
                true
            }
        };

        if forget {
            if let Err(e) = session.remove_value(AUTH_USER_KEY).await {
                error!(error = %e, "session update failed");
                return status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }

        next.run(req).await
    }
}

/// Sends anonymous visitors to the login page; keeps protected pages out of
/// browser caches.
pub struct RequireAuthentication;

#[async_trait]
impl Interceptor for RequireAuthentication {
    fn name(&self) -> &'static str {
        "require_authentication"
    }

    async fn intercept(&self, req: Request, next: Next) -> Response {
        if req.extensions().get::<Authenticated>().is_none() {
            return Redirect::to(LOGIN_PATH).into_response();
        }
        let mut res = next.run(req).await;
        res.headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        res
    }
}
