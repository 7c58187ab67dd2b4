//! Primitive aliases shared by every crate in the workspace.

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Name of the entity kinds as they appear in error messages.
pub mod entity {
    pub const USER: &str = "User";
    pub const PROJECT: &str = "Project";
    pub const TASK: &str = "Task";
}
