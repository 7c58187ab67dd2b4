#![allow(dead_code)]

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use taskboard_core::lifecycle::ServiceRegistry;
use taskboard_core::roles::Role;
use taskboard_core::types::DbId;
use taskboard_db::models::user::CreateUser;
use taskboard_db::repositories::UserRepo;
use taskboard_db::DatabaseService;
use tower::ServiceExt;

use taskboard_api::auth::jwt::{generate_access_token, JwtConfig};
use taskboard_api::auth::password::hash_password;
use taskboard_api::bootstrap::{build_state, register_services};
use taskboard_api::config::{Environment, LogFormat, ServerConfig};
use taskboard_api::router::build_app_router;
use taskboard_api::state::AppState;

pub const TEST_PASSWORD: &str = "test-password-123";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: Environment::Test,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: String::new(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
        seed_dev_data: false,
        seed_admin_password: TEST_PASSWORD.to_string(),
        log_format: LogFormat::Pretty,
    }
}

/// Start every service against `pool` (already migrated by `sqlx::test`)
/// and return the resulting state.
pub async fn build_test_state(pool: PgPool, config: ServerConfig) -> AppState {
    let mut registry = ServiceRegistry::new();
    let database = DatabaseService::from_pool(pool).without_migrations();
    let keys = register_services(&mut registry, Arc::new(config), database)
        .expect("services should register");
    registry.start().await.expect("services should start");
    build_state(registry, &keys, Instant::now()).expect("state should build")
}

/// Full application router with the production middleware stack.
pub async fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config()).await
}

pub async fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = build_test_state(pool, config.clone()).await;
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the body's `data`.
pub async fn expect_data(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    let mut json = body_json(response).await;
    json["data"].take()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Insert a user directly and return its id plus an access token.
pub async fn create_user(pool: &PgPool, email: &str, role: Role) -> (DbId, String) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role,
        },
    )
    .await
    .expect("user creation should succeed");

    let token = generate_access_token(user.id, role, &test_config().jwt).unwrap();
    (user.id, token)
}

pub async fn create_admin(pool: &PgPool) -> (DbId, String) {
    create_user(pool, "admin@test.com", Role::Admin).await
}

/// Create a project through the API as `admin_token`; returns its id.
pub async fn create_project(app: Router, admin_token: &str, title: &str) -> DbId {
    let response = post_json_auth(
        app,
        "/api/v1/projects",
        admin_token,
        json!({ "title": title, "description": "A test project" }),
    )
    .await;
    let data = expect_data(response, StatusCode::CREATED).await;
    data["id"].as_i64().unwrap()
}

/// Create a task through the API; returns the task JSON.
pub async fn create_task(
    app: Router,
    token: &str,
    project_id: DbId,
    assignee_id: DbId,
    title: &str,
) -> Value {
    let response = post_json_auth(
        app,
        "/api/v1/tasks",
        token,
        json!({
            "title": title,
            "projectId": project_id,
            "assigneeId": assignee_id,
        }),
    )
    .await;
    expect_data(response, StatusCode::CREATED).await
}
