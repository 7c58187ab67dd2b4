use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use taskboard_core::error::CoreError;
use taskboard_core::lifecycle::{LifecycleError, Service};
use taskboard_core::task::{creation_actions, update_actions, TaskStatus};
use taskboard_core::types::{entity, DbId};
use taskboard_core::validation::Violations;
use taskboard_db::models::task::{CreateTask, Task, TaskWithDetails, UpdateTask};
use taskboard_db::repositories::{ProjectRepo, TaskRepo, TimelineRepo, UserRepo};
use taskboard_events::{EventBus, TaskChange, TaskChangeKind};

use crate::error::{AppError, AppResult};

/// Enforces the task status state machine and keeps every task's timeline
/// in step with its row.
pub struct TaskEngine {
    pool: PgPool,
    events: Arc<EventBus>,
}

impl TaskEngine {
    pub fn new(pool: PgPool, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }

    /// Create a task in `TODO` and record `CREATED` + `MOVED_TO_TODO`.
    pub async fn create_task(
        &self,
        input: &CreateTask,
        actor_id: DbId,
    ) -> AppResult<TaskWithDetails> {
        let mut violations = input.validate();
        self.check_project(&mut violations, input.project_id).await?;
        self.check_assignee(&mut violations, input.assignee_id).await?;
        violations.into_result()?;

        let mut tx = self.pool.begin().await?;
        let task = TaskRepo::create(&mut *tx, input).await?;
        TimelineRepo::create_many(&mut *tx, task.id, actor_id, &creation_actions()).await?;
        tx.commit().await?;

        tracing::info!(
            task_id = task.id,
            project_id = task.project_id,
            actor_id,
            "Task created"
        );
        self.publish(TaskChangeKind::Created, &task, actor_id);

        self.get_task(task.id).await
    }

    /// Full-field edit.
    ///
    /// Records `UPDATED`, plus the matching `MOVED_TO_*` when the status
    /// changed and `ASSIGNED` when the assignee changed.
    pub async fn update_task(
        &self,
        task_id: DbId,
        input: &UpdateTask,
        actor_id: DbId,
    ) -> AppResult<TaskWithDetails> {
        let mut violations = input.validate();
        self.check_assignee(&mut violations, input.assignee_id).await?;
        violations.into_result()?;

        let mut tx = self.pool.begin().await?;
        let current = TaskRepo::find_for_update(&mut *tx, task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;

        if let Some(next) = input.status {
            ensure_transition(current.status, next)?;
        }

        let actions = update_actions(current.tracked(), input.apply_to(current.tracked()));
        let task = TaskRepo::update(&mut *tx, task_id, input)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;
        TimelineRepo::create_many(&mut *tx, task_id, actor_id, &actions).await?;
        tx.commit().await?;

        tracing::info!(
            task_id,
            project_id = task.project_id,
            actor_id,
            events = actions.len(),
            "Task updated"
        );
        self.publish(TaskChangeKind::Updated, &task, actor_id);

        self.get_task(task_id).await
    }

    /// Status-only transition. Records exactly one `MOVED_TO_*` event.
    pub async fn update_task_status(
        &self,
        task_id: DbId,
        status: TaskStatus,
        actor_id: DbId,
    ) -> AppResult<TaskWithDetails> {
        let mut tx = self.pool.begin().await?;
        let current = TaskRepo::find_for_update(&mut *tx, task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;
        ensure_transition(current.status, status)?;

        let task = TaskRepo::update_status(&mut *tx, task_id, status)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;
        TimelineRepo::create_many(&mut *tx, task_id, actor_id, &[status.transition_action()])
            .await?;
        tx.commit().await?;

        tracing::info!(
            task_id,
            project_id = task.project_id,
            actor_id,
            from = %current.status,
            to = %status,
            "Task status changed"
        );
        self.publish(TaskChangeKind::StatusChanged, &task, actor_id);

        self.get_task(task_id).await
    }

    /// Remove a task and its whole timeline atomically.
    pub async fn delete_task(&self, task_id: DbId, actor_id: DbId) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let task = TaskRepo::find_for_update(&mut *tx, task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;

        let events = TimelineRepo::delete_for_task(&mut *tx, task_id).await?;
        if !TaskRepo::delete(&mut *tx, task_id).await? {
            return Err(task_not_found(task_id));
        }
        tx.commit().await?;

        tracing::info!(
            task_id,
            project_id = task.project_id,
            actor_id,
            events,
            "Task deleted"
        );
        self.publish(TaskChangeKind::Deleted, &task, actor_id);
        Ok(())
    }

    /// A task with its assignee and timeline (newest first).
    pub async fn get_task(&self, task_id: DbId) -> AppResult<TaskWithDetails> {
        TaskRepo::find_with_details(&self.pool, task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))
    }

    /// Every task of a project, most recently updated first.
    pub async fn list_project_tasks(&self, project_id: DbId) -> AppResult<Vec<TaskWithDetails>> {
        if !ProjectRepo::exists(&self.pool, project_id).await? {
            return Err(AppError::Core(CoreError::NotFound {
                entity: entity::PROJECT,
                id: project_id,
            }));
        }
        Ok(TaskRepo::list_by_project(&self.pool, project_id).await?)
    }

    async fn check_project(&self, violations: &mut Violations, project_id: DbId) -> AppResult<()> {
        if !violations.has_field("projectId")
            && !ProjectRepo::exists(&self.pool, project_id).await?
        {
            violations.push("projectId", "Project doesn't exist");
        }
        Ok(())
    }

    async fn check_assignee(&self, violations: &mut Violations, user_id: DbId) -> AppResult<()> {
        if !violations.has_field("assigneeId") && !UserRepo::exists(&self.pool, user_id).await? {
            violations.push("assigneeId", "Assignee doesn't exist");
        }
        Ok(())
    }

    fn publish(&self, kind: TaskChangeKind, task: &Task, actor_id: DbId) {
        self.events
            .publish(TaskChange::new(kind, task.project_id, task.id, actor_id));
    }
}

fn task_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: entity::TASK,
        id,
    })
}

fn ensure_transition(from: TaskStatus, to: TaskStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::field(
            "status",
            format!("Cannot move a task from {from} to {to}"),
        )))
    }
}

#[async_trait]
impl Service for TaskEngine {
    async fn initialize(&self) -> Result<(), LifecycleError> {
        tracing::info!("Task engine ready");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.pool.is_closed()
    }
}
