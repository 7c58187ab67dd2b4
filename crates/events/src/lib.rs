//! Taskboard event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TaskChange`]: published after every committed task mutation; the
//!   realtime fan-out subscribes to it and pushes fresh boards to clients.

pub mod bus;

pub use bus::{EventBus, TaskChange, TaskChangeKind};
