//! Taskboard domain core.
//!
//! Pure domain logic shared by the persistence and HTTP layers: entity
//! enums and the task status state machine, explicit input validators, the
//! domain error taxonomy, and the service lifecycle registry used to boot
//! and tear down the server's singletons.
//!
//! Nothing in this crate touches the database or the network.

pub mod error;
pub mod lifecycle;
pub mod roles;
pub mod task;
pub mod types;
pub mod validation;
