use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use rand::{distributions::Alphanumeric, Rng};
use subtle::ConstantTimeEq;
use tower_sessions::session;
use tracing::{error, warn};

use crate::{error::status_response, middleware::Interceptor, session::Session};

pub const CSRF_TOKEN_KEY: &str = "csrf_token";
pub const CSRF_FORM_FIELD: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";
const BODY_LIMIT: usize = 1024 * 1024;
const TOKEN_LEN: usize = 32;

/// The session's CSRF token, available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// The session's token, minted on first use. Only pages that render a form
/// call this, so anonymous reads never write a session.
pub async fn ensure_token(session: &Session) -> Result<String, session::Error> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN_KEY).await? {
        return Ok(token);
    }
    let token = generate_token();
    session.insert(CSRF_TOKEN_KEY, &token).await?;
    Ok(token)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn submitted_token(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    form_urlencoded::parse(body)
        .find(|(k, _)| k == CSRF_FORM_FIELD)
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            headers
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
}

fn tokens_match(submitted: Option<&str>, expected: &str) -> bool {
    match submitted {
        Some(s) if !s.is_empty() => s.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    }
}

/// Rejects state-changing requests that do not echo the session's token.
/// A session without a token rejects every such request. Must run inside
/// [`LoadAndSave`](super::session::LoadAndSave).
pub struct VerifyCsrf;

#[async_trait]
impl Interceptor for VerifyCsrf {
    fn name(&self) -> &'static str {
        "verify_csrf"
    }

    async fn intercept(&self, req: Request, next: Next) -> Response {
        let Some(session) = req.extensions().get::<Session>().cloned() else {
            error!("csrf check running without a session");
            return status_response(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let expected = match session.get::<String>(CSRF_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "csrf token lookup failed");
                return status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let mut req = if is_safe(req.method()) {
            req
        } else {
            let (parts, body) = req.into_parts();
            let bytes = match to_bytes(body, BODY_LIMIT).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, "could not read request body");
                    return status_response(StatusCode::BAD_REQUEST);
                }
            };
            let submitted = submitted_token(&parts.headers, &bytes);
            if !tokens_match(submitted.as_deref(), expected.as_deref().unwrap_or("")) {
                warn!(method = %parts.method, uri = %parts.uri, "csrf token mismatch");
                return status_response(StatusCode::BAD_REQUEST);
            }
            Request::from_parts(parts, Body::from(bytes))
        };

        if let Some(token) = expected {
            req.extensions_mut().insert(CsrfToken(token));
        }
        next.run(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_alphanumeric() {
        let a = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, generate_token());
    }

    #[tokio::test]
    async fn token_is_minted_once_per_session() {
        let store = std::sync::Arc::new(tower_sessions::MemoryStore::default());
        let session = Session::new(None, store, None);
        let first = ensure_token(&session).await.unwrap();
        assert_eq!(ensure_token(&session).await.unwrap(), first);
        assert_eq!(
            session.get::<String>(CSRF_TOKEN_KEY).await.unwrap(),
            Some(first)
        );
    }

    #[test]
    fn safe_methods_skip_verification() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::HEAD));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }

    #[test]
    fn token_is_read_from_form_then_header() {
        let mut headers = HeaderMap::new();
        let body = Bytes::from_static(b"title=x&csrf_token=abc&content=y");
        assert_eq!(submitted_token(&headers, &body).as_deref(), Some("abc"));

        headers.insert(CSRF_HEADER, "from-header".parse().unwrap());
        let body = Bytes::from_static(b"title=x");
        assert_eq!(
            submitted_token(&headers, &body).as_deref(),
            Some("from-header")
        );
        assert_eq!(submitted_token(&HeaderMap::new(), &body), None);
    }

    #[test]
    fn comparison_requires_exact_non_empty_match() {
        assert!(tokens_match(Some("abc"), "abc"));
        assert!(!tokens_match(Some("abd"), "abc"));
        assert!(!tokens_match(Some("ab"), "abc"));
        assert!(!tokens_match(Some(""), ""));
        assert!(!tokens_match(None, "abc"));
    }
}
