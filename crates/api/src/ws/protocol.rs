//! Realtime wire format.
//!
//! Client requests are text frames of the form
//! `{ "event": ..., "ack": ..., "data": { ... } }`. Every request is
//! answered with an [`Ack`] echoing `event` and `ack`. Board changes are
//! pushed to channel subscribers as a [`TasksUpdated`] frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskboard_core::task::TaskStatus;
use taskboard_core::types::DbId;
use taskboard_db::models::task::TaskWithDetails;

pub const EVENT_TASKS: &str = "tasks";
pub const EVENT_TASK_STATUS_UPDATE: &str = "task_status_update";
pub const EVENT_TASKS_UPDATED: &str = "tasks_updated";

/// Outer shape of every client frame.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub event: String,
    /// Opaque correlation id, echoed back untouched.
    #[serde(default)]
    pub ack: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

/// `tasks`: fetch a project's board and subscribe to its updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksRequest {
    pub token: String,
    pub project_id: DbId,
}

/// `task_status_update`: move a task to another column.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub token: String,
    pub task: StatusChange,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub id: DbId,
    pub status: TaskStatus,
}

/// A decoded client request.
#[derive(Debug)]
pub enum ClientRequest {
    Tasks(TasksRequest),
    TaskStatusUpdate(StatusUpdateRequest),
}

/// Why a frame could not be turned into a [`ClientRequest`].
///
/// Carries whatever of the envelope could be read so the error ack can
/// still echo it.
#[derive(Debug)]
pub struct ParseFailure {
    pub event: String,
    pub ack: Option<Value>,
    pub reason: String,
}

/// Decode one text frame.
pub fn parse(text: &str) -> Result<(ClientRequest, Option<Value>, String), ParseFailure> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| ParseFailure {
        event: String::new(),
        ack: None,
        reason: format!("Malformed message: {e}"),
    })?;

    let fail = |reason: String| ParseFailure {
        event: envelope.event.clone(),
        ack: envelope.ack.clone(),
        reason,
    };

    let request = match envelope.event.as_str() {
        EVENT_TASKS => serde_json::from_value(envelope.data.clone())
            .map(ClientRequest::Tasks)
            .map_err(|e| fail(format!("Invalid tasks request: {e}")))?,
        EVENT_TASK_STATUS_UPDATE => serde_json::from_value(envelope.data.clone())
            .map(ClientRequest::TaskStatusUpdate)
            .map_err(|e| fail(format!("Invalid task_status_update request: {e}")))?,
        other => return Err(fail(format!("Unknown event '{other}'"))),
    };

    Ok((request, envelope.ack, envelope.event))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
    Error,
}

/// Reply to a single client request.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub event: String,
    pub ack: Option<Value>,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskWithDetails>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok(event: String, ack: Option<Value>, tasks: Vec<TaskWithDetails>) -> Self {
        Self {
            event,
            ack,
            status: AckStatus::Ok,
            tasks: Some(tasks),
            error: None,
        }
    }

    pub fn error(event: String, ack: Option<Value>, error: impl Into<String>) -> Self {
        Self {
            event,
            ack,
            status: AckStatus::Error,
            tasks: None,
            error: Some(error.into()),
        }
    }
}

/// Push sent to every subscriber of a project channel after a task change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksUpdated<'a> {
    pub event: &'static str,
    pub project_id: DbId,
    pub tasks: &'a [TaskWithDetails],
}

impl<'a> TasksUpdated<'a> {
    pub fn new(project_id: DbId, tasks: &'a [TaskWithDetails]) -> Self {
        Self {
            event: EVENT_TASKS_UPDATED,
            project_id,
            tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_tasks_request() {
        let (request, ack, event) =
            parse(r#"{"event":"tasks","ack":3,"data":{"token":"t","projectId":9}}"#).unwrap();
        assert_eq!(event, "tasks");
        assert_eq!(ack, Some(json!(3)));
        assert_matches!(request, ClientRequest::Tasks(TasksRequest { project_id: 9, .. }));
    }

    #[test]
    fn parses_status_update_request() {
        let (request, _, _) = parse(
            r#"{"event":"task_status_update","data":{"token":"t","task":{"id":4,"status":"DONE"}}}"#,
        )
        .unwrap();
        assert_matches!(
            request,
            ClientRequest::TaskStatusUpdate(StatusUpdateRequest {
                task: StatusChange { id: 4, status: TaskStatus::Done },
                ..
            })
        );
    }

    #[test]
    fn unknown_event_keeps_ack_for_the_reply() {
        let failure = parse(r#"{"event":"chat","ack":"a1","data":{}}"#).unwrap_err();
        assert_eq!(failure.event, "chat");
        assert_eq!(failure.ack, Some(json!("a1")));
        assert!(failure.reason.contains("Unknown event"));
    }

    #[test]
    fn bad_status_is_rejected() {
        let failure = parse(
            r#"{"event":"task_status_update","ack":1,"data":{"token":"t","task":{"id":4,"status":"ARCHIVED"}}}"#,
        )
        .unwrap_err();
        assert_eq!(failure.event, "task_status_update");
        assert_eq!(failure.ack, Some(json!(1)));
    }

    #[test]
    fn non_json_frame_is_malformed() {
        let failure = parse("hello").unwrap_err();
        assert!(failure.reason.starts_with("Malformed message"));
        assert_eq!(failure.ack, None);
    }

    #[test]
    fn error_ack_has_error_status_and_no_tasks() {
        let ack = Ack::error("tasks".into(), Some(json!(2)), "Invalid or expired token");
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({
                "event": "tasks",
                "ack": 2,
                "status": "error",
                "error": "Invalid or expired token"
            })
        );
    }

    #[test]
    fn push_frame_shape() {
        let push = TasksUpdated::new(5, &[]);
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({ "event": "tasks_updated", "projectId": 5, "tasks": [] })
        );
    }
}
