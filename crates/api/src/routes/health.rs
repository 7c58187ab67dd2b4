use std::collections::BTreeMap;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use taskboard_core::lifecycle::RegistryStats;
use taskboard_core::types::Timestamp;

use crate::state::AppState;

/// Payload of `GET /`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub health_check: &'static str,
}

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when every service reports healthy, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub timestamp: Timestamp,
    pub uptime_secs: u64,
    pub environment: &'static str,
    /// Per-service health, keyed by registry name.
    pub services: BTreeMap<String, bool>,
    /// Services in the order the registry started them.
    pub startup_order: Vec<String>,
    pub registry: RegistryStats,
}

/// GET / -- API banner.
async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Taskboard API",
        version: env!("CARGO_PKG_VERSION"),
        health_check: "/health",
    })
}

/// GET /health -- per-service health from the registry.
///
/// Always 200; callers read `status`.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.registry.read().await;
    let services = registry.health_check().await;
    let startup_order = registry
        .initialization_order()
        .into_iter()
        .map(str::to_string)
        .collect();
    let stats = registry.stats();
    drop(registry);

    let status = if services.values().all(|healthy| *healthy) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        environment: state.config.environment.as_str(),
        services,
        startup_order,
        registry: stats,
    })
}

/// Mount root-level routes (NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
}
