//! Repository for the `timelines` table.

use std::collections::HashMap;

use sqlx::{PgExecutor, PgPool};
use taskboard_core::task::TimelineAction;
use taskboard_core::types::DbId;

use crate::models::timeline::{NewTimeline, Timeline, TimelineEntry};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, task_id, actor_id, action, occurred_at";

/// Event columns plus the actor's name.
const ENTRY_COLUMNS: &str = "tl.id, tl.task_id, tl.actor_id, tl.action, tl.occurred_at, \
                             u.first_name AS actor_first_name, u.last_name AS actor_last_name";

/// Append and read task history. Events are never updated.
pub struct TimelineRepo;

impl TimelineRepo {
    /// Append one event.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &NewTimeline,
    ) -> Result<Timeline, sqlx::Error> {
        let query = format!(
            "INSERT INTO timelines (task_id, actor_id, action)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Timeline>(&query)
            .bind(input.task_id)
            .bind(input.actor_id)
            .bind(input.action.as_str())
            .fetch_one(executor)
            .await
    }

    /// Append several events for one task, in the given order, in a single
    /// statement.
    pub async fn create_many<'e>(
        executor: impl PgExecutor<'e>,
        task_id: DbId,
        actor_id: DbId,
        actions: &[TimelineAction],
    ) -> Result<Vec<Timeline>, sqlx::Error> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        let query = format!(
            "INSERT INTO timelines (task_id, actor_id, action)
             SELECT $1, $2, a.action
             FROM UNNEST($3::text[]) WITH ORDINALITY AS a(action, ord)
             ORDER BY a.ord
             RETURNING {COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, Timeline>(&query)
            .bind(task_id)
            .bind(actor_id)
            .bind(names)
            .fetch_all(executor)
            .await?;
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    /// A task's events, newest first (ties broken by id).
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Vec<TimelineEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS}
             FROM timelines tl
             JOIN users u ON u.id = tl.actor_id
             WHERE tl.task_id = $1
             ORDER BY tl.occurred_at DESC, tl.id DESC"
        );
        sqlx::query_as::<_, TimelineEntry>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Events of several tasks, keyed by task ID, each list newest first.
    pub async fn list_for_tasks(
        pool: &PgPool,
        task_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<TimelineEntry>>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT {ENTRY_COLUMNS}
             FROM timelines tl
             JOIN users u ON u.id = tl.actor_id
             WHERE tl.task_id = ANY($1)
             ORDER BY tl.occurred_at DESC, tl.id DESC"
        );
        let entries = sqlx::query_as::<_, TimelineEntry>(&query)
            .bind(task_ids)
            .fetch_all(pool)
            .await?;

        let mut by_task: HashMap<DbId, Vec<TimelineEntry>> = HashMap::new();
        for entry in entries {
            by_task.entry(entry.event.task_id).or_default().push(entry);
        }
        Ok(by_task)
    }

    /// Remove every event of a task. Only called as part of deleting the task.
    ///
    /// Returns the number of rows removed.
    pub async fn delete_for_task<'e>(
        executor: impl PgExecutor<'e>,
        task_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM timelines WHERE task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_for_task<'e>(
        executor: impl PgExecutor<'e>,
        task_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM timelines WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}
