//! Handlers for the `/auth` resource (sign-up, sign-in).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use taskboard_core::error::CoreError;
use taskboard_core::roles::Role;
use taskboard_core::validation::{rules, Violations};
use taskboard_db::models::user::{CreateUser, User, UserResponse};
use taskboard_db::repositories::UserRepo;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/sign-up`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignUpRequest {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        rules::name(&mut v, "firstName", "First name", &self.first_name);
        rules::name(&mut v, "lastName", "Last name", &self.last_name);
        rules::email(&mut v, "email", &self.email);
        rules::password(&mut v, "password", &self.password);
        v
    }
}

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignInRequest {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        rules::email(&mut v, "email", &self.email);
        rules::required(&mut v, "password", "Password", &self.password);
        v
    }
}

/// Successful authentication payload.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// HS256 access token; send as `Authorization: Bearer <token>`.
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/sign-up
///
/// Create a `USER` account and sign it in. Duplicate emails are a 409.
pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(input): AppJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthResponse>>)> {
    input.validate().into_result()?;

    let email = input.email.trim().to_string();
    if UserRepo::exists_by_email(&state.pool, &email).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "User with email already exists.".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email,
            password_hash,
            role: Role::User,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User signed up");
    let response = auth_response(&state, user)?;
    Ok(DataResponse::created("User account created.", response))
}

/// POST /api/v1/auth/sign-in
///
/// Exchange email + password for an access token.
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(input): AppJson<SignInRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    input.validate().into_result()?;

    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Sign-in rejected: wrong password");
        return Err(invalid());
    }

    tracing::info!(user_id = user.id, "User signed in");
    let response = auth_response(&state, user)?;
    Ok(DataResponse::ok("Sign in successful.", response))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn auth_response(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let token = generate_access_token(user.id, user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}
