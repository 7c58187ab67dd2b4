//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! take `&PgPool`; writes take any `PgExecutor` so they can join a caller's
//! transaction (`&mut *tx`) or run directly on the pool.

pub mod project_repo;
pub mod task_repo;
pub mod timeline_repo;
pub mod user_repo;

pub use project_repo::ProjectRepo;
pub use task_repo::TaskRepo;
pub use timeline_repo::TimelineRepo;
pub use user_repo::UserRepo;
