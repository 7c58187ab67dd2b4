//! Task lifecycle engine.
//!
//! [`TaskEngine`] owns every task mutation. Each one runs in a single
//! transaction that writes the row change together with its timeline
//! events, then publishes a [`TaskChange`](taskboard_events::TaskChange)
//! once the transaction has committed.

mod tasks;

pub use tasks::TaskEngine;
