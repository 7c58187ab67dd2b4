//! Handlers for the `/projects` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use taskboard_db::models::project::{CreateProject, Project, ProjectWithTasks};
use taskboard_db::repositories::ProjectRepo;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate().into_result()?;
    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, actor_id = admin.user_id, "Project created");
    Ok(DataResponse::created("Project created.", project))
}

/// GET /api/v1/projects
///
/// Newest first, each with its full board.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ProjectWithTasks>>>> {
    let projects = ProjectRepo::list_with_tasks(&state.pool).await?;
    Ok(DataResponse::ok("All projects.", projects))
}
