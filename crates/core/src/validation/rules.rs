//! Field-level validation rules.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::Violations;

/// Maximum length of task and project titles.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of names and free-text descriptions.
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// `value` must contain non-whitespace text.
pub fn required(v: &mut Violations, field: &str, label: &str, value: &str) {
    v.check(!value.trim().is_empty(), field, format!("{label} is required"));
}

/// A title: required and 1 to [`MAX_TITLE_LENGTH`] characters.
pub fn title(v: &mut Violations, field: &str, value: &str) {
    let len = value.trim().chars().count();
    if len == 0 {
        v.push(field, "Title is required");
    } else if len > MAX_TITLE_LENGTH {
        v.push(
            field,
            format!("Title must be 1 to {MAX_TITLE_LENGTH} character length"),
        );
    }
}

/// A required description of bounded length.
pub fn description(v: &mut Violations, field: &str, value: &str) {
    required(v, field, "Description", value);
    if !v.has_field(field) && value.chars().count() > MAX_DESCRIPTION_LENGTH {
        v.push(
            field,
            format!("Description must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
    }
}

/// An optional description: absent is fine, present must be valid.
pub fn optional_description(v: &mut Violations, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        description(v, field, value);
    }
}

/// A person's name component.
pub fn name(v: &mut Violations, field: &str, label: &str, value: &str) {
    required(v, field, label, value);
    if !v.has_field(field) && value.trim().chars().count() > MAX_NAME_LENGTH {
        v.push(
            field,
            format!("{label} must be at most {MAX_NAME_LENGTH} characters"),
        );
    }
}

/// A syntactically valid email address.
pub fn email(v: &mut Violations, field: &str, value: &str) {
    if value.trim().is_empty() {
        v.push(field, "Email is required");
    } else if !value.trim().validate_email() {
        v.push(field, "Invalid email");
    }
}

/// A password of at least [`MIN_PASSWORD_LENGTH`] characters.
pub fn password(v: &mut Violations, field: &str, value: &str) {
    if value.is_empty() {
        v.push(field, "Password is required");
    } else if value.chars().count() < MIN_PASSWORD_LENGTH {
        v.push(
            field,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
        );
    }
}

/// A positive database id.
pub fn id(v: &mut Violations, field: &str, label: &str, value: i64) {
    v.check(value > 0, field, format!("{label} is invalid"));
}

/// A required reference to another row; `0` means the client omitted it.
pub fn reference(v: &mut Violations, field: &str, label: &str, value: i64) {
    if value == 0 {
        v.push(field, format!("{label} is required"));
    } else {
        id(v, field, label, value);
    }
}
