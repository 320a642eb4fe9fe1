use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        dto::{UserLoginForm, UserSignupForm},
        extractors::{AuthUser, AUTH_USER_KEY},
        repo_types::UserError,
    },
    error::{internal, AppError},
    form::PostForm,
    session::Session,
    state::AppState,
    templates::{PageContext, FLASH_KEY},
    validator::Validatable,
};

const AFTER_LOGIN_PATH: &str = "/snippet/create";

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", get(user_signup).post(user_signup_post))
        .route("/user/login", get(user_login).post(user_login_post))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/user/logout", post(user_logout_post))
}

#[instrument(skip_all)]
pub async fn user_signup(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    let data = page.form_data(&UserSignupForm::default()).await?;
    state.templates.respond(StatusCode::OK, "signup.html", &data)
}

#[instrument(skip_all)]
pub async fn user_signup_post(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> Result<Response, AppError> {
    form.validate();

    if form.valid() {
        match state
            .users
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(id) => {
                info!(id, "user signed up");
                session
                    .insert(FLASH_KEY, "Your signup was successful. Please log in.")
                    .await
                    .map_err(internal)?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(UserError::DuplicateEmail) => {
                warn!("signup with an email already in use");
                form.check_field(false, "email", "Email address is already in use");
            }
            Err(e) => return Err(internal(e)),
        }
    }

    debug!(errors = ?form.errors(), "signup form rejected");
    let data = page.form_data(&form).await?;
    state
        .templates
        .respond(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data)
}

#[instrument(skip_all)]
pub async fn user_login(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    let data = page.form_data(&UserLoginForm::default()).await?;
    state.templates.respond(StatusCode::OK, "login.html", &data)
}

#[instrument(skip_all)]
pub async fn user_login_post(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> Result<Response, AppError> {
    form.validate();

    if form.valid() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(id) => {
                session.cycle_id().await.map_err(internal)?;
                session.insert(AUTH_USER_KEY, id).await.map_err(internal)?;
                info!(id, "user logged in");
                return Ok(Redirect::to(AFTER_LOGIN_PATH).into_response());
            }
            Err(UserError::InvalidCredentials) => {
                warn!("login with bad credentials");
                form.add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(internal(e)),
        }
    }

    let data = page.form_data(&form).await?;
    state
        .templates
        .respond(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data)
}

#[instrument(skip_all)]
pub async fn user_logout_post(
    AuthUser(user_id): AuthUser,
    session: Session,
) -> Result<Response, AppError> {
    session.cycle_id().await.map_err(internal)?;
    session
        .remove_value(AUTH_USER_KEY)
        .await
        .map_err(internal)?;
    session
        .insert(FLASH_KEY, "You've been logged out successfully!")
        .await
        .map_err(internal)?;
    info!(user_id, "user logged out");
    Ok(Redirect::to("/").into_response())
}
