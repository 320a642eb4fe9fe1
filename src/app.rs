use std::{net::SocketAddr, time::Duration};

use axum::{http::StatusCode, response::Response, routing::get, Router};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::{
    auth,
    error::status_response,
    middleware::{
        auth::{Authenticate, RequireAuthentication},
        csrf::VerifyCsrf,
        session::LoadAndSave,
        standard::{CommonHeaders, LogRequest, RecoverPanic},
        Chain,
    },
    session, snippets,
    state::AppState,
};

/// Chains every route runs through, outermost first.
pub struct Chains {
    pub standard: Chain,
    pub dynamic: Chain,
    pub protected: Chain,
}

impl Chains {
    pub fn new<S: SessionStore + Clone>(state: &AppState, sessions: S) -> Self {
        let standard = Chain::new()
            .with(RecoverPanic)
            .with(LogRequest)
            .with(CommonHeaders);
        let dynamic = Chain::new()
            .with(LoadAndSave::new(session::layer(
                sessions,
                &state.config.session,
            )))
            .with(VerifyCsrf)
            .with(Authenticate::new(state.users.clone()));
        let protected = dynamic.append(RequireAuthentication);
        Self {
            standard,
            dynamic,
            protected,
        }
    }
}

/// The whole app, with sessions kept in `sessions`.
pub fn build_app<S: SessionStore + Clone>(state: AppState, sessions: S) -> Router {
    let chains = Chains::new(&state, sessions);
    tracing::debug!(
        standard = ?chains.standard.names(),
        protected = ?chains.protected.names(),
        "interceptor chains"
    );

    let dynamic = chains.dynamic.then(
        Router::new()
            .merge(snippets::public_router())
            .merge(auth::public_router()),
    );
    let protected = chains.protected.then(
        Router::new()
            .merge(snippets::protected_router())
            .merge(auth::protected_router()),
    );

    let routes = Router::new()
        .route("/ping", get(ping))
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .merge(dynamic)
        .merge(protected)
        .fallback(not_found);

    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    chains
        .standard
        .then(routes)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::debug!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

async fn ping() -> &'static str {
    "OK"
}

async fn not_found() -> Response {
    status_response(StatusCode::NOT_FOUND)
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
