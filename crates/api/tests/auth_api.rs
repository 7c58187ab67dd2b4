//! HTTP-level integration tests for sign-up, sign-in and access control.

mod common;

use axum::http::StatusCode;
use common::{body_json, expect_data, get, get_auth, post_json, TEST_PASSWORD};
use serde_json::json;
use sqlx::PgPool;
use taskboard_core::roles::Role;

fn sign_up_body(email: &str) -> serde_json::Value {
    json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": email,
        "password": "correct-horse",
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sign_up_creates_user_and_returns_token(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = post_json(app.clone(), "/api/v1/auth/sign-up", sign_up_body("jane@test.com")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;

    assert_eq!(json["message"], "User account created.");
    assert_eq!(json["data"]["user"]["email"], "jane@test.com");
    assert_eq!(json["data"]["user"]["role"], "USER");
    assert!(json["data"]["user"].get("passwordHash").is_none());

    // The returned token works on protected routes.
    let token = json["data"]["token"].as_str().unwrap();
    let response = get_auth(app, "/api/v1/users", token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sign_up_rejects_duplicate_email(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let first = post_json(app.clone(), "/api/v1/auth/sign-up", sign_up_body("dup@test.com")).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app, "/api/v1/auth/sign-up", sign_up_body("DUP@test.com")).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sign_up_reports_field_errors(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = post_json(
        app,
        "/api/v1/auth/sign-up",
        json!({ "firstName": "", "lastName": "Doe", "email": "nope", "password": "x" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"]["firstName"].is_string());
    assert_eq!(json["error"]["email"], "Invalid email");
    assert!(json["error"]["password"].is_string());
    assert!(json["error"].get("lastName").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sign_in_with_valid_credentials(pool: PgPool) {
    let (user_id, _) = common::create_user(&pool, "signin@test.com", Role::User).await;
    let app = common::build_test_app(pool).await;

    let response = post_json(
        app,
        "/api/v1/auth/sign-in",
        json!({ "email": "signin@test.com", "password": TEST_PASSWORD }),
    )
    .await;
    let data = expect_data(response, StatusCode::OK).await;

    assert_eq!(data["user"]["id"], user_id);
    assert!(data["token"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sign_in_with_wrong_password_is_401(pool: PgPool) {
    common::create_user(&pool, "wrongpw@test.com", Role::User).await;
    let app = common::build_test_app(pool).await;

    let response = post_json(
        app,
        "/api/v1/auth/sign-in",
        json!({ "email": "wrongpw@test.com", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid email or password");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sign_in_with_unknown_email_is_401(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = post_json(
        app,
        "/api/v1/auth/sign-in",
        json!({ "email": "ghost@test.com", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn protected_route_without_token_is_401(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = get(app, "/api/v1/projects").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Unauthorized. Please sign in.");
    assert_eq!(json["error"], "Unauthorized");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn garbage_token_is_401(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = get_auth(app, "/api/v1/users", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid or expired token");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn users_list_hides_password_hashes(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "lister@test.com", Role::User).await;
    common::create_admin(&pool).await;
    let app = common::build_test_app(pool).await;

    let json = body_json(get_auth(app, "/api/v1/users", &token).await).await;
    assert_eq!(json["message"], "All users.");
    let users = json["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}
