//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`TaskChange`]s.
//! It is shared via `Arc<EventBus>` across the application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::lifecycle::Service;
use taskboard_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// TaskChange
// ---------------------------------------------------------------------------

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskChangeKind {
    Created,
    Updated,
    StatusChanged,
    Deleted,
}

/// A committed mutation of one task.
///
/// Carries identifiers only; subscribers re-read whatever state they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChange {
    pub kind: TaskChangeKind,
    pub project_id: DbId,
    pub task_id: DbId,
    pub actor_id: DbId,
    pub timestamp: DateTime<Utc>,
}

impl TaskChange {
    pub fn new(kind: TaskChangeKind, project_id: DbId, task_id: DbId, actor_id: DbId) -> Self {
        Self {
            kind,
            project_id,
            task_id,
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`TaskChange`].
///
/// # Usage
///
/// ```rust
/// use taskboard_events::bus::{EventBus, TaskChange, TaskChangeKind};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(TaskChange::new(TaskChangeKind::Created, 1, 10, 7));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<TaskChange>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a change to all current subscribers.
    ///
    /// If there are no active subscribers the change is silently dropped.
    pub fn publish(&self, change: TaskChange) {
        tracing::debug!(
            kind = ?change.kind,
            project_id = change.project_id,
            task_id = change.task_id,
            "Publishing task change"
        );
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(change);
    }

    /// Subscribe to all changes published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Service for EventBus {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
