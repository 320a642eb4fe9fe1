use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Errors a handler can bail out with.
///
/// Domain failures that re-render a form never become an `AppError`; they are
/// handled where the form is.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request")]
    BadRequest,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub fn internal<E>(e: E) -> AppError
where
    E: Into<anyhow::Error>,
{
    AppError::Internal(e.into())
}

pub fn status_response(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    (status, reason).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest => status_response(StatusCode::BAD_REQUEST),
            AppError::NotFound => status_response(StatusCode::NOT_FOUND),
            AppError::Internal(e) => {
                error!(error = ?e, "server error");
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
