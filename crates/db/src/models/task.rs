//! Task entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taskboard_core::task::{Priority, TaskStatus, TrackedFields};
use taskboard_core::types::{DbId, Timestamp};
use taskboard_core::validation::{rules, Violations};

use crate::models::timeline::TimelineEntry;

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub priority: Priority,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub project_id: DbId,
    pub assignee_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// The fields whose changes are recorded as dedicated timeline actions.
    pub fn tracked(&self) -> TrackedFields {
        TrackedFields {
            status: self.status,
            assignee_id: self.assignee_id,
        }
    }
}

/// Name of the user a task is assigned to.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeSummary {
    #[sqlx(rename = "assignee_id")]
    pub id: DbId,
    #[sqlx(rename = "assignee_first_name")]
    pub first_name: String,
    #[sqlx(rename = "assignee_last_name")]
    pub last_name: String,
}

/// A task as shown on the board: assignee name and full timeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithDetails {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: AssigneeSummary,
    /// Newest first.
    pub timelines: Vec<TimelineEntry>,
}

/// DTO for creating a task.
///
/// Has no `status` field: new tasks always start in
/// [`TaskStatus::INITIAL`] and any status sent by the client is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to [`Priority::Low`].
    pub priority: Option<Priority>,
    #[serde(default)]
    pub project_id: DbId,
    #[serde(default)]
    pub assignee_id: DbId,
}

impl CreateTask {
    /// Shape checks only; existence of the project and assignee is checked
    /// by the caller against the database.
    pub fn validate(&self) -> Violations {
        let mut v = Violations::new();
        rules::title(&mut v, "title", &self.title);
        rules::optional_description(&mut v, "description", self.description.as_deref());
        rules::reference(&mut v, "projectId", "Project ID", self.project_id);
        rules::reference(&mut v, "assigneeId", "Assignee ID", self.assignee_id);
        v
    }
}

/// DTO for a full-field task edit.
///
/// `priority`, `status` and `description` keep their current value when
/// omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assignee_id: DbId,
}

impl UpdateTask {
    pub fn validate(&self) -> Violations {
        let mut v = Violations::new();
        rules::title(&mut v, "title", &self.title);
        rules::optional_description(&mut v, "description", self.description.as_deref());
        rules::reference(&mut v, "assigneeId", "Assignee ID", self.assignee_id);
        v
    }

    /// Tracked fields after applying this edit to `current`.
    pub fn apply_to(&self, current: TrackedFields) -> TrackedFields {
        TrackedFields {
            status: self.status.unwrap_or(current.status),
            assignee_id: self.assignee_id,
        }
    }
}

/// DTO for a status-only transition.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateTaskStatus {
    pub status: TaskStatus,
}
