//! Timeline (task history) model.
//!
//! Events are append-only: there is no update DTO and rows are only ever
//! deleted together with their task.

use serde::Serialize;
use sqlx::FromRow;
use taskboard_core::task::TimelineAction;
use taskboard_core::types::{DbId, Timestamp};

/// A row from the `timelines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub id: DbId,
    pub task_id: DbId,
    pub actor_id: DbId,
    #[sqlx(try_from = "String")]
    pub action: TimelineAction,
    #[serde(rename = "timestamp")]
    pub occurred_at: Timestamp,
}

/// Insert payload for a single event.
#[derive(Debug, Clone, Copy)]
pub struct NewTimeline {
    pub task_id: DbId,
    pub actor_id: DbId,
    pub action: TimelineAction,
}

/// Display name of the user who caused an event.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSummary {
    #[sqlx(rename = "actor_first_name")]
    pub first_name: String,
    #[sqlx(rename = "actor_last_name")]
    pub last_name: String,
}

/// A timeline event joined with its actor's name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Timeline,
    #[sqlx(flatten)]
    pub actor: ActorSummary,
}
