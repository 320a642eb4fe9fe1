use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::{debug, info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::{internal, AppError},
    form::PostForm,
    session::Session,
    snippets::{dto::SnippetCreateForm, repo_types::SnippetError},
    state::AppState,
    templates::{PageContext, FLASH_KEY},
    validator::Validatable,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/snippet/view/:id", get(snippet_view))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/snippet/create", get(snippet_create).post(snippet_create_post))
}

#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, page: PageContext) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await.map_err(internal)?;

    let mut data = page.template_data().await?;
    data.snippets = snippets;
    state.templates.respond(StatusCode::OK, "home.html", &data)
}

/// Ids that are not positive integers read as missing, same as absent or
/// expired snippets.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

#[instrument(skip_all)]
pub async fn snippet_view(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    page: PageContext,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id).ok_or(AppError::NotFound)?;

    let snippet = match state.snippets.get(id).await {
        Ok(s) => s,
        Err(SnippetError::NoRecord) => return Err(AppError::NotFound),
        Err(e) => return Err(internal(e)),
    };

    let mut data = page.template_data().await?;
    data.snippet = Some(snippet);
    state.templates.respond(StatusCode::OK, "view.html", &data)
}

#[instrument(skip_all)]
pub async fn snippet_create(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    let data = page.form_data(&SnippetCreateForm::default()).await?;
    state.templates.respond(StatusCode::OK, "create.html", &data)
}

#[instrument(skip_all)]
pub async fn snippet_create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    session: Session,
    page: PageContext,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.valid() {
        debug!(errors = ?form.errors(), "snippet form rejected");
        let data = page.form_data(&form).await?;
        return state
            .templates
            .respond(StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await
        .map_err(internal)?;
    info!(id, user_id, "snippet created");

    session
        .insert(FLASH_KEY, "Snippet successfully created!")
        .await
        .map_err(internal)?;
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
