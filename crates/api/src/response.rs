//! Shared success envelope for API handlers.
//!
//! Every successful response is `{ "message": ..., "data": ... }`. Use
//! [`DataResponse`] instead of ad-hoc `serde_json::json!` so the shape stays
//! consistent.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Standard `{ "message": ..., "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(DataResponse::ok("All users.", users))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    /// 200 with the envelope.
    pub fn ok(message: &'static str, data: T) -> Json<Self> {
        Json(Self { message, data })
    }

    /// 201 with the envelope.
    pub fn created(message: &'static str, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(Self { message, data }))
    }
}
