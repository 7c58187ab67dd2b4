pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                          WebSocket (per-frame token auth)
///
/// /auth/sign-up                create account (public)
/// /auth/sign-in                sign in (public)
///
/// /users                       list (auth)
///
/// /projects                    list (auth), create (admin)
///
/// /tasks?projectId={id}        list (auth), create (auth)
/// /tasks/{id}                  get, update (auth), delete (admin)
/// /tasks/{id}/status           status transition (auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/projects", projects::router())
        .nest("/tasks", tasks::router())
}
