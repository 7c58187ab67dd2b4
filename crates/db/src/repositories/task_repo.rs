//! Repository for the `tasks` table.

use std::collections::HashMap;

use sqlx::{FromRow, PgExecutor, PgPool};
use taskboard_core::task::TaskStatus;
use taskboard_core::types::DbId;

use crate::models::task::{AssigneeSummary, CreateTask, Task, TaskWithDetails, UpdateTask};
use crate::repositories::TimelineRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, priority, status, project_id, assignee_id, \
                       created_at, updated_at";

/// Task columns plus the assignee's name, for the board queries.
const DETAIL_COLUMNS: &str = "t.id, t.title, t.description, t.priority, t.status, t.project_id, \
                              t.assignee_id, t.created_at, t.updated_at, \
                              u.first_name AS assignee_first_name, \
                              u.last_name AS assignee_last_name";

#[derive(FromRow)]
struct TaskRow {
    #[sqlx(flatten)]
    task: Task,
    #[sqlx(flatten)]
    assignee: AssigneeSummary,
}

/// Provides CRUD operations for tasks.
///
/// Write methods accept any executor so the task engine can run them inside
/// its transaction together with the matching timeline writes.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task in [`TaskStatus::INITIAL`], returning the created row.
    ///
    /// Priority defaults to `LOW`; text fields are stored trimmed.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (title, description, priority, status, project_id, assignee_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.title.trim())
            .bind(input.description.as_deref().map(str::trim))
            .bind(input.priority.unwrap_or_default().as_str())
            .bind(TaskStatus::INITIAL.as_str())
            .bind(input.project_id)
            .bind(input.assignee_id)
            .fetch_one(executor)
            .await
    }

    /// Find a task by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a task and lock its row until the surrounding transaction ends.
    pub async fn find_for_update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a task with its assignee and timeline.
    pub async fn find_with_details(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TaskWithDetails>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS}
             FROM tasks t
             JOIN users u ON u.id = t.assignee_id
             WHERE t.id = $1"
        );
        let Some(row) = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let timelines = TimelineRepo::list_for_task(pool, row.task.id).await?;
        Ok(Some(TaskWithDetails {
            task: row.task,
            assignee: row.assignee,
            timelines,
        }))
    }

    /// A project's board: tasks most recently updated first, each with its
    /// assignee and timeline.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<TaskWithDetails>, sqlx::Error> {
        let mut by_project = Self::list_by_projects(pool, &[project_id]).await?;
        Ok(by_project.remove(&project_id).unwrap_or_default())
    }

    /// Boards of several projects at once, keyed by project ID.
    ///
    /// Projects without tasks are absent from the map.
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<TaskWithDetails>>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT {DETAIL_COLUMNS}
             FROM tasks t
             JOIN users u ON u.id = t.assignee_id
             WHERE t.project_id = ANY($1)
             ORDER BY t.updated_at DESC, t.id DESC"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await?;

        let task_ids: Vec<DbId> = rows.iter().map(|r| r.task.id).collect();
        let mut timelines = TimelineRepo::list_for_tasks(pool, &task_ids).await?;

        let mut boards: HashMap<DbId, Vec<TaskWithDetails>> = HashMap::new();
        for row in rows {
            boards
                .entry(row.task.project_id)
                .or_default()
                .push(TaskWithDetails {
                    timelines: timelines.remove(&row.task.id).unwrap_or_default(),
                    task: row.task,
                    assignee: row.assignee,
                });
        }
        Ok(boards)
    }

    /// Full-field edit. Omitted `description`, `priority` and `status` keep
    /// their current values.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = $2,
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                status = COALESCE($5, status),
                assignee_id = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(input.title.trim())
            .bind(input.description.as_deref().map(str::trim))
            .bind(input.priority.map(|p| p.as_str()))
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.assignee_id)
            .fetch_optional(executor)
            .await
    }

    /// Set only the status.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("UPDATE tasks SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(executor)
            .await
    }

    /// Delete the task row. Its timeline must already be gone, otherwise the
    /// foreign key rejects the delete.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}
