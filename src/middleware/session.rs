use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tower::{service_fn, Layer, ServiceExt};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::error;

use crate::{error::status_response, middleware::Interceptor};

/// Runs the rest of the chain inside the session layer, which loads the
/// session into request extensions and saves it once the response is ready.
pub struct LoadAndSave<S: SessionStore + Clone> {
    sessions: SessionManagerLayer<S>,
}

impl<S: SessionStore + Clone> LoadAndSave<S> {
    pub fn new(sessions: SessionManagerLayer<S>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl<S: SessionStore + Clone> Interceptor for LoadAndSave<S> {
    fn name(&self) -> &'static str {
        "load_and_save"
    }

    async fn intercept(&self, req: Request, next: Next) -> Response {
        let inner = service_fn(move |req: Request| {
            let next = next.clone();
            async move { Ok::<_, Infallible>(next.run(req).await) }
        });

        let mut res = match self.sessions.layer(inner).oneshot(req).await {
            Ok(res) => res,
            Err(e) => {
                error!(error = %e, "session layer failed");
                return status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let headers = res.headers_mut();
        headers.append(header::VARY, HeaderValue::from_static("Cookie"));
        if headers.contains_key(header::SET_COOKIE) {
            headers.append(
                header::CACHE_CONTROL,
                HeaderValue::from_static(r#"no-cache="Set-Cookie""#),
            );
        }
        res
    }
}
