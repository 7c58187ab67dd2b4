//! Handlers for the `/users` resource.

use axum::extract::State;
use axum::Json;
use taskboard_db::models::user::UserResponse;
use taskboard_db::repositories::UserRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users
///
/// Every user, for the assignee picker.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(DataResponse::ok(
        "All users.",
        users.into_iter().map(UserResponse::from).collect(),
    ))
}
