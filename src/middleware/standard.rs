use std::{any::Any, net::SocketAddr, panic::AssertUnwindSafe};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use tracing::{error, info};

use crate::{error::status_response, middleware::Interceptor};

/// Turns a panic anywhere downstream into a 500 and asks the client to drop
/// the connection.
pub struct RecoverPanic;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[async_trait]
impl Interceptor for RecoverPanic {
    fn name(&self) -> &'static str {
        "recover_panic"
    }

    async fn intercept(&self, req: Request, next: Next) -> Response {
        let method = req.method().clone();
        let uri = req.uri().clone();
        match AssertUnwindSafe(next.run(req)).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => {
                error!(%method, %uri, panic = panic_message(payload.as_ref()), "handler panicked");
                let mut res = status_response(StatusCode::INTERNAL_SERVER_ERROR);
                res.headers_mut()
                    .insert(header::CONNECTION, HeaderValue::from_static("close"));
                res
            }
        }
    }
}

/// Logs every request before it is handled.
pub struct LogRequest;

#[async_trait]
impl Interceptor for LogRequest {
    fn name(&self) -> &'static str {
        "log_request"
    }

    async fn intercept(&self, req: Request, next: Next) -> Response {
        let ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "-".into());
        info!(
            %ip,
            proto = ?req.version(),
            method = %req.method(),
            uri = %req.uri(),
            "received request"
        );
        next.run(req).await
    }
}

pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

/// Hardening headers set on every response.
pub struct CommonHeaders;

#[async_trait]
impl Interceptor for CommonHeaders {
    fn name(&self) -> &'static str {
        "common_headers"
    }

    async fn intercept(&self, req: Request, next: Next) -> Response {
        let mut res = next.run(req).await;
        let headers = res.headers_mut();
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        );
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
        headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
        headers.insert(header::SERVER, HeaderValue::from_static("Rust"));
        res
    }
}
