use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

/// URL-encoded POST body decoded into `T` by field name.
///
/// Unlike [`axum::Form`], any decode failure is a plain 400.
pub struct PostForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(%rejection, "form decode failed");
                Err(AppError::BadRequest)
            }
        }
    }
}
