//! Request interceptors and the chains that compose them.
//!
//! Every interceptor has the same `(request, next) -> response` shape. A
//! [`Chain`] is an ordered list of them: the first link is the outermost,
//! so it sees the request first and the response last.

pub mod auth;
pub mod csrf;
pub mod session;
pub mod standard;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    response::Response,
    Router,
};

#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Short name used in logs and tests.
    fn name(&self) -> &'static str;

    /// Inspect or rewrite `req`, then either answer directly or delegate to
    /// `next` and post-process what comes back.
    async fn intercept(&self, req: Request, next: Next) -> Response;
}

#[derive(Clone, Default)]
pub struct Chain {
    links: Vec<Arc<dyn Interceptor>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I: Interceptor>(mut self, link: I) -> Self {
        self.links.push(Arc::new(link));
        self
    }

    /// A new chain: this one followed by `link`. `self` is left untouched.
    pub fn append<I: Interceptor>(&self, link: I) -> Self {
        self.clone().with(link)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.links.iter().map(|l| l.name()).collect()
    }

    /// Wrap every route (and the fallback) of `router` in this chain.
    pub fn then<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // Router::layer wraps outside whatever is already there, so fold from
        // the innermost link outwards.
        self.links.iter().rev().fold(router, |router, link| {
            let link = Arc::clone(link);
            router.layer(from_fn(move |req: Request, next: Next| {
                let link = Arc::clone(&link);
                async move { link.intercept(req, next).await }
            }))
        })
    }
}
