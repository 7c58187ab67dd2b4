use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use taskboard_core::error::CoreError;
use taskboard_core::validation::FieldViolation;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `taskboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Failure envelope: `{ "message", "error", "code" }`.
///
/// `error` is a `{ field: message }` map for field validation failures and
/// the HTTP reason phrase otherwise.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: Value,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Full internal cause of a failed request.
///
/// Attached as a response extension; `middleware::error_detail` copies it
/// into the body when running in development and drops it otherwise.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// What a single error turns into on the wire.
struct Classified {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Option<BTreeMap<String, String>>,
}

impl Classified {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: None,
        }
    }
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.classify().status
    }

    /// Machine-readable error code (`NOT_FOUND`, `VALIDATION_ERROR`, ...).
    pub fn code(&self) -> &'static str {
        self.classify().code
    }

    /// Message safe to show to a client.
    pub fn public_message(&self) -> String {
        self.classify().message
    }

    fn classify(&self) -> Classified {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => {
                    Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
                }
                CoreError::Validation(msg) => Classified::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    msg.clone(),
                ),
                CoreError::InvalidFields(violations) => Classified {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    code: "VALIDATION_ERROR",
                    message: "Validation failed".to_string(),
                    fields: Some(field_map(violations)),
                },
                CoreError::Conflict(msg) => {
                    Classified::new(StatusCode::CONFLICT, "CONFLICT", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    Classified::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => {
                    Classified::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
                }
                CoreError::Internal(_) => Classified::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                ),
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::InternalError(_) => Classified::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = self.classify();

        if classified.status.is_server_error() {
            tracing::error!(error = %self, code = classified.code, "Request failed");
        } else {
            tracing::debug!(error = %self, code = classified.code, "Request rejected");
        }

        let error = match classified.fields {
            Some(fields) => serde_json::to_value(fields).unwrap_or(Value::Null),
            None => Value::String(
                classified
                    .status
                    .canonical_reason()
                    .unwrap_or("Error")
                    .to_string(),
            ),
        };

        let body = ErrorBody {
            message: classified.message,
            error,
            code: classified.code,
            detail: None,
        };

        let mut response = (classified.status, axum::Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetail(self.to_string()));
        response
    }
}

fn field_map(violations: &[FieldViolation]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for violation in violations {
        // First violation per field wins.
        map.entry(violation.field.clone())
            .or_insert_with(|| violation.message.clone());
    }
    map
}

/// Classify a sqlx error into an HTTP status, error code and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations (`23505`) map to 409.
/// - Foreign-key violations (`23503`) map to 422: the request referenced a
///   row that does not exist or still has dependents.
/// - Everything else is a 500 `PERSISTENCE_ERROR` whose message names the
///   SQLSTATE class.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => {
            Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            let sqlstate = db_err.code();
            match sqlstate.as_deref() {
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    Classified::new(
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    )
                }
                Some("23503") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    Classified::new(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "VALIDATION_ERROR",
                        format!("Referenced record is missing or still in use: {constraint}"),
                    )
                }
                code => Classified::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    persistence_message(code),
                ),
            }
        }
        sqlx::Error::PoolTimedOut => Classified::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PERSISTENCE_ERROR",
            "Database timed out",
        ),
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => Classified::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PERSISTENCE_ERROR",
            "Database connection failed",
        ),
        _ => Classified::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PERSISTENCE_ERROR",
            "Database error",
        ),
    }
}

/// Readable cause for a PostgreSQL SQLSTATE, by class.
fn persistence_message(sqlstate: Option<&str>) -> &'static str {
    let Some(code) = sqlstate else {
        return "Database error";
    };
    match code.get(..2) {
        Some("08") => "Database connection failed",
        Some("23") => "Database constraint violated",
        Some("40") => "Database transaction conflict",
        Some("53") => "Database is out of resources",
        Some("57") if code == "57014" => "Database timed out",
        Some("57") => "Database is unavailable",
        Some("22") => "Invalid data for database",
        _ => "Database error",
    }
}
