//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` input DTOs with an explicit `validate()`
//! - Enriched read models returned by list endpoints

pub mod project;
pub mod task;
pub mod timeline;
pub mod user;
