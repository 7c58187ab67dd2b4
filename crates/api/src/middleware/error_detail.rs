//! Exposes internal error detail to clients in development only.
//!
//! [`AppError`](crate::error::AppError) responses carry the full cause as an
//! [`ErrorDetail`] extension. Outside development the extension is dropped;
//! in development it is written into the JSON body as `detail`.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;

use crate::config::Environment;
use crate::error::ErrorDetail;

/// Error bodies are small; anything larger is passed through untouched.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

pub async fn attach_error_detail(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if !environment.is_development() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not buffer error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut json: Value = match serde_json::from_slice(&bytes) {
        Ok(json) => json,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    let Some(object) = json.as_object_mut() else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    object.insert("detail".to_string(), Value::String(detail));

    match serde_json::to_vec(&json) {
        Ok(encoded) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(encoded))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use taskboard_core::error::CoreError;
    use tower::ServiceExt;

    use super::*;
    use crate::error::AppError;

    async fn failing() -> Result<(), AppError> {
        Err(AppError::Core(CoreError::Internal("pool exhausted".into())))
    }

    fn app(environment: Environment) -> Router {
        Router::new()
            .route("/fail", get(failing))
            .route("/ok", get(|| async { "fine" }))
            .layer(axum::middleware::from_fn_with_state(
                environment,
                attach_error_detail,
            ))
    }

    async fn call(app: Router, uri: &str) -> (u16, Vec<u8>) {
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn development_includes_detail() {
        let (status, body) = call(app(Environment::Development), "/fail").await;
        assert_eq!(status, 500);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["message"], "An internal error occurred");
        assert_eq!(json["detail"], "Internal error: pool exhausted");
    }

    #[tokio::test]
    async fn production_hides_detail() {
        let (_, body) = call(app(Environment::Production), "/fail").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("detail").is_none());
        assert_eq!(json["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn successful_responses_pass_through() {
        let (status, body) = call(app(Environment::Development), "/ok").await;
        assert_eq!(status, 200);
        assert_eq!(body, b"fine");
    }
}
