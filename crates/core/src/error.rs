//! Domain error taxonomy.

use crate::types::DbId;
use crate::validation::FieldViolation;

/// Errors raised by domain logic, independent of transport.
///
/// The HTTP layer maps each variant onto a status code; the realtime layer
/// turns them into error acknowledgements.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A single malformed or semantically invalid input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// One or more field-level violations collected by a validator.
    #[error("Validation failed: {}", summarize(.0))]
    InvalidFields(Vec<FieldViolation>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a single-field violation.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        CoreError::InvalidFields(vec![FieldViolation::new(field, message)])
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}
