//! Body and query extractors whose rejections use the API error envelope.
//!
//! Axum's own `Json` and `Query` reject with plain-text 4xx bodies. These
//! wrappers turn a malformed body or query string into a 422
//! `VALIDATION_ERROR` like any other invalid input.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use taskboard_core::error::CoreError;

use crate::error::AppError;

/// `Json<T>` with an [`AppError`] rejection.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::Core(CoreError::Validation(
                rejection.body_text(),
            ))),
        }
    }
}

/// `Query<T>` with an [`AppError`] rejection.
#[derive(Debug)]
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => Err(AppError::Core(CoreError::Validation(
                rejection.body_text(),
            ))),
        }
    }
}
