//! Repository for the `projects` table.

use sqlx::{PgExecutor, PgPool};
use taskboard_core::types::DbId;

use crate::models::project::{CreateProject, Project, ProjectWithTasks};
use crate::repositories::TaskRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, created_at, updated_at";

/// Provides create and read operations for projects.
///
/// Projects are never updated or deleted.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row. Title and
    /// description are stored trimmed.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (title, description)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.title.trim())
            .bind(input.description.trim())
            .fetch_one(executor)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }

    /// List all projects ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// List all projects, newest first, each with its board.
    pub async fn list_with_tasks(pool: &PgPool) -> Result<Vec<ProjectWithTasks>, sqlx::Error> {
        let projects = Self::list(pool).await?;
        let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
        let mut tasks = TaskRepo::list_by_projects(pool, &ids).await?;

        Ok(projects
            .into_iter()
            .map(|project| ProjectWithTasks {
                tasks: tasks.remove(&project.id).unwrap_or_default(),
                project,
            })
            .collect())
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
