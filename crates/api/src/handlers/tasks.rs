//! Handlers for the `/tasks` resource.
//!
//! Thin wrappers over [`TaskEngine`](crate::engine::TaskEngine); every
//! mutation and its timeline bookkeeping happens there.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use taskboard_core::error::CoreError;
use taskboard_core::types::DbId;
use taskboard_db::models::task::{CreateTask, TaskWithDetails, UpdateTask, UpdateTaskStatus};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query string for `GET /tasks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub project_id: Option<DbId>,
}

/// POST /api/v1/tasks
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(input): AppJson<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<TaskWithDetails>>)> {
    let task = state.engine.create_task(&input, user.user_id).await?;
    Ok(DataResponse::created("Task created.", task))
}

/// GET /api/v1/tasks?projectId={id}
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(query): AppQuery<TaskListQuery>,
) -> AppResult<Json<DataResponse<Vec<TaskWithDetails>>>> {
    let project_id = query.project_id.ok_or_else(|| {
        AppError::Core(CoreError::field("projectId", "Project ID is required"))
    })?;
    let tasks = state.engine.list_project_tasks(project_id).await?;
    Ok(DataResponse::ok("All tasks.", tasks))
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskWithDetails>>> {
    let task = state.engine.get_task(id).await?;
    Ok(DataResponse::ok("Task details.", task))
}

/// PATCH /api/v1/tasks/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateTask>,
) -> AppResult<Json<DataResponse<TaskWithDetails>>> {
    let task = state.engine.update_task(id, &input, user.user_id).await?;
    Ok(DataResponse::ok("Task updated.", task))
}

/// PATCH /api/v1/tasks/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateTaskStatus>,
) -> AppResult<Json<DataResponse<TaskWithDetails>>> {
    let task = state
        .engine
        .update_task_status(id, input.status, user.user_id)
        .await?;
    Ok(DataResponse::ok("Task status updated.", task))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<()>>> {
    state.engine.delete_task(id, admin.user_id).await?;
    Ok(DataResponse::ok("Task deleted.", ()))
}
