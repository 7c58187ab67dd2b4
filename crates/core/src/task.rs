//! Task enums and the task status state machine.
//!
//! String values must match the `CHECK` constraints in
//! `20260301000003_create_tasks_table.sql` and
//! `20260301000004_create_timelines_table.sql`.
//!
//! The status graph is fully connected: any status may move to any other,
//! `DONE` can be reopened, and there is no terminal state. Every accepted
//! status change is recorded as exactly one `MOVED_TO_*` timeline action.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Generates a text-backed enum with `as_str`, `from_str_db`, `ALL`,
/// `Display` and `TryFrom<String>`, serialized in SCREAMING_SNAKE_CASE.
macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All values as stored in the database.
            pub const ALL: &'static [&'static str] = &[$($val),+];

            /// Return the value as stored in the database.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $val ),+
                }
            }

            /// Parse a value read from the database or supplied by a client.
            pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
                match s {
                    $( $val => Ok(Self::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        "{} must be {}",
                        $label,
                        Self::ALL.join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_str_db(&value)
            }
        }
    };
}

define_text_enum! {
    /// Column of the board a task sits in.
    TaskStatus ("Status") {
        Todo = "TODO",
        InProgress = "IN_PROGRESS",
        Done = "DONE",
    }
}

define_text_enum! {
    /// Task urgency. Defaults to [`Priority::Low`] on creation.
    Priority ("Priority") {
        Low = "LOW",
        High = "HIGH",
        Urgent = "URGENT",
    }
}

define_text_enum! {
    /// Kind of entry recorded in a task's timeline.
    TimelineAction ("Action") {
        Created = "CREATED",
        Updated = "UPDATED",
        Deleted = "DELETED",
        Assigned = "ASSIGNED",
        MovedToTodo = "MOVED_TO_TODO",
        MovedToInProgress = "MOVED_TO_IN_PROGRESS",
        MovedToDone = "MOVED_TO_DONE",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Low
    }
}

impl TaskStatus {
    /// Status every new task starts in, whatever the client asked for.
    pub const INITIAL: TaskStatus = TaskStatus::Todo;

    /// Timeline action recording a move into this status.
    pub fn transition_action(self) -> TimelineAction {
        match self {
            Self::Todo => TimelineAction::MovedToTodo,
            Self::InProgress => TimelineAction::MovedToInProgress,
            Self::Done => TimelineAction::MovedToDone,
        }
    }

    /// Whether a task in this status may move to `next`.
    ///
    /// Back-transitions are allowed, so this holds for every pair.
    pub fn can_transition_to(self, _next: TaskStatus) -> bool {
        true
    }
}

impl TimelineAction {
    /// The status a `MOVED_TO_*` action moved the task into.
    pub fn target_status(self) -> Option<TaskStatus> {
        match self {
            Self::MovedToTodo => Some(TaskStatus::Todo),
            Self::MovedToInProgress => Some(TaskStatus::InProgress),
            Self::MovedToDone => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// Timeline actions recorded when a task is created.
pub fn creation_actions() -> [TimelineAction; 2] {
    [
        TimelineAction::Created,
        TaskStatus::INITIAL.transition_action(),
    ]
}

/// The parts of a task that drive which timeline actions an edit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedFields {
    pub status: TaskStatus,
    pub assignee_id: DbId,
}

/// Timeline actions recorded by a full-field edit.
///
/// Always `UPDATED`; followed by the `MOVED_TO_*` action when the status
/// changed and by `ASSIGNED` when the assignee changed.
pub fn update_actions(before: TrackedFields, after: TrackedFields) -> Vec<TimelineAction> {
    let mut actions = vec![TimelineAction::Updated];
    if before.status != after.status {
        actions.push(after.status.transition_action());
    }
    if before.assignee_id != after.assignee_id {
        actions.push(TimelineAction::Assigned);
    }
    actions
}
