//! HTTP-level integration tests for the `/projects` resource.

mod common;

use axum::http::StatusCode;
use common::{body_json, expect_data, get_auth, post_json_auth};
use serde_json::json;
use sqlx::PgPool;
use taskboard_core::roles::Role;

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creates_project(pool: PgPool) {
    let (_, admin) = common::create_admin(&pool).await;
    let app = common::build_test_app(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &admin,
        json!({ "title": "Website", "description": "Marketing site" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;

    assert_eq!(json["message"], "Project created.");
    assert_eq!(json["data"]["title"], "Website");
    assert!(json["data"]["createdAt"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_admin_cannot_create_project(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "user@test.com", Role::User).await;
    let app = common::build_test_app(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token,
        json!({ "title": "Website", "description": "Marketing site" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Access Denied.");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn project_title_is_validated(pool: PgPool) {
    let (_, admin) = common::create_admin(&pool).await;
    let app = common::build_test_app(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &admin,
        json!({ "title": "x".repeat(51), "description": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["error"]["title"].is_string());
    assert!(json["error"]["description"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_returns_projects_with_their_boards(pool: PgPool) {
    let (admin_id, admin) = common::create_admin(&pool).await;
    let app = common::build_test_app(pool).await;

    let first = common::create_project(app.clone(), &admin, "First").await;
    let second = common::create_project(app.clone(), &admin, "Second").await;
    common::create_task(app.clone(), &admin, first, admin_id, "Only task").await;

    let data = expect_data(get_auth(app, "/api/v1/projects", &admin).await, StatusCode::OK).await;
    let projects = data.as_array().unwrap();
    assert_eq!(projects.len(), 2);

    // Newest first.
    assert_eq!(projects[0]["id"], second);
    assert_eq!(projects[0]["tasks"].as_array().unwrap().len(), 0);
    assert_eq!(projects[1]["id"], first);
    assert_eq!(projects[1]["tasks"][0]["title"], "Only task");
}
