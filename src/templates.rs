use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime, UtcOffset};

use crate::{
    auth::extractors::Authenticated,
    error::{internal, AppError},
    middleware::csrf::{ensure_token, CsrfToken},
    session::Session,
    snippets::repo_types::Snippet,
};

pub const FLASH_KEY: &str = "flash";

const PAGES: &[(&str, &str)] = &[
    ("base.html", include_str!("../ui/html/base.html")),
    ("nav.html", include_str!("../ui/html/partials/nav.html")),
    ("home.html", include_str!("../ui/html/pages/home.html")),
    ("view.html", include_str!("../ui/html/pages/view.html")),
    ("create.html", include_str!("../ui/html/pages/create.html")),
    ("signup.html", include_str!("../ui/html/pages/signup.html")),
    ("login.html", include_str!("../ui/html/pages/login.html")),
];

/// Formats as `02 Jan 2006 at 15:04`, always in UTC.
pub fn human_date(t: OffsetDateTime) -> String {
    let fmt = format_description!("[day] [month repr:short] [year] at [hour]:[minute]");
    t.to_offset(UtcOffset::UTC).format(&fmt).unwrap_or_default()
}

fn human_date_filter(value: String) -> String {
    OffsetDateTime::parse(&value, &Rfc3339)
        .map(human_date)
        .unwrap_or_default()
}

/// Compiled templates. Built once at startup and only read afterwards.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.add_filter("human_date", human_date_filter);
        for &(name, source) in PAGES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, page: &str, data: &TemplateData) -> Result<String, minijinja::Error> {
        self.env.get_template(page)?.render(data)
    }

    /// Render into a buffer first, so a failing template becomes a clean 500.
    pub fn respond(&self, status: StatusCode, page: &str, data: &TemplateData) -> Result<Response, AppError> {
        let body = self.render(page, data).map_err(internal)?;
        Ok((status, Html(body)).into_response())
    }
}

/// Everything a page template can see.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub form: Option<Value>,
}

impl TemplateData {
    pub fn with_form<F: Serialize>(mut self, form: &F) -> Self {
        self.form = Some(Value::from_serialize(form));
        self
    }
}

/// Per-request inputs shared by every rendered page.
pub struct PageContext {
    session: Session,
    csrf_token: Option<String>,
    is_authenticated: bool,
}

impl PageContext {
    /// Fresh template data; consumes the pending flash message, if any.
    pub async fn template_data(&self) -> Result<TemplateData, AppError> {
        let csrf_token = match &self.csrf_token {
            Some(token) => token.clone(),
            // The nav's logout form needs one.
            None if self.is_authenticated => ensure_token(&self.session).await.map_err(internal)?,
            None => String::new(),
        };
        let flash = self
            .session
            .remove::<String>(FLASH_KEY)
            .await
            .map_err(internal)?;
        Ok(TemplateData {
            current_year: OffsetDateTime::now_utc().year(),
            flash,
            is_authenticated: self.is_authenticated,
            csrf_token,
            ..TemplateData::default()
        })
    }

    /// Template data for a page that renders `form`, with a CSRF token
    /// guaranteed.
    pub async fn form_data<F: Serialize>(&self, form: &F) -> Result<TemplateData, AppError> {
        let mut data = self.template_data().await?;
        if data.csrf_token.is_empty() {
            data.csrf_token = ensure_token(&self.session).await.map_err(internal)?;
        }
        Ok(data.with_form(form))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| internal(anyhow::anyhow!("page rendered outside the session layer")))?;
        let csrf_token = parts.extensions.get::<CsrfToken>().map(|t| t.0.clone());
        let is_authenticated = parts.extensions.get::<Authenticated>().is_some();
        Ok(Self {
            session,
            csrf_token,
            is_authenticated,
        })
    }
}
