//! Taskboard API server library.
//!
//! Exposes the building blocks (config, service wiring, state, error
//! handling, routes, realtime infrastructure) so integration tests and the
//! binary entrypoint can both access them.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod ws;
