//! Authentication extractors and response middleware.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `ADMIN` role.
//! - [`error_detail::attach_error_detail`] -- Adds internal error detail to
//!   failure bodies in development.

pub mod auth;
pub mod error_detail;
pub mod rbac;
