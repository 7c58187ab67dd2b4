//! Explicit input validation.
//!
//! Each request DTO exposes a `validate()` function built from the rule
//! functions in [`rules`]. Rules push [`FieldViolation`]s into a
//! [`Violations`] collector; a non-empty collector becomes
//! [`CoreError::InvalidFields`](crate::error::CoreError::InvalidFields).
//!
//! Checks that need the database (does this project exist?) are not rules:
//! callers perform them through the repositories and report the result with
//! [`Violations::push`].

pub mod rules;

pub use rules::FieldViolation;

use crate::error::CoreError;

/// Accumulates field violations across every rule run for one input.
#[derive(Debug, Default)]
pub struct Violations {
    items: Vec<FieldViolation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.items.push(FieldViolation::new(field, message));
    }

    /// Record a violation for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fields that already failed; later rules for the same field are skipped.
    pub fn has_field(&self, field: &str) -> bool {
        self.items.iter().any(|v| v.field == field)
    }

    pub fn into_vec(self) -> Vec<FieldViolation> {
        self.items
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(self.items))
        }
    }
}
