//! In-process HTTP client for exercising the full router in tests.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{self, header, HeaderMap, StatusCode},
    Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use crate::{app::build_app, auth::memory::MemoryUserStore, state::AppState};

lazy_static! {
    static ref CSRF_INPUT_RX: Regex =
        Regex::new(r"<input type='hidden' name='csrf_token' value='(.+?)'>").unwrap();
}

pub fn extract_csrf_token(body: &str) -> String {
    CSRF_INPUT_RX
        .captures(body)
        .map(|c| c[1].to_string())
        .expect("page carries a csrf token")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Sends requests through a fresh clone of the app, replaying cookies the
/// way a browser would.
pub struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
        }
    }

    /// A client over the fake state, plus a handle on its user store.
    pub fn fake() -> (Self, Arc<MemoryUserStore>) {
        let (state, users) = AppState::fake();
        (Self::new(build_app(state, MemoryStore::default())), users)
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = http::Request::get(uri);
        self.send(req, Body::empty()).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let req = http::Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(req, Body::from(body)).await
    }

    /// GET `page` and return the CSRF token it embeds.
    pub async fn csrf_token(&mut self, page: &str) -> String {
        let res = self.get(page).await;
        extract_csrf_token(&res.body)
    }

    /// Log in as the seeded user.
    pub async fn login_as_alice(&mut self) {
        let token = self.csrf_token("/user/login").await;
        let res = self
            .post_form(
                "/user/login",
                &[
                    ("email", "alice@example.com"),
                    ("password", "pa$$word"),
                    ("csrf_token", &token),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "{}", res.body);
    }

    async fn send(&mut self, mut req: http::request::Builder, body: Body) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            req = req.header(header::COOKIE, cookie);
        }
        let req = req.body(body).unwrap();

        let res = self.app.clone().oneshot(req).await.unwrap();
        for set_cookie in res.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
