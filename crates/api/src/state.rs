use std::sync::Arc;

use taskboard_core::lifecycle::ServiceRegistry;
use taskboard_events::EventBus;
use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::engine::TaskEngine;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc` or is already `Clone`.
/// Built once in `main` from the started service registry.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: taskboard_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    pub event_bus: Arc<EventBus>,
    pub engine: Arc<TaskEngine>,
    /// Read by `/health` for the per-service report.
    pub registry: Arc<RwLock<ServiceRegistry>>,
    /// Process start, for the uptime reported by `/health`.
    pub started_at: std::time::Instant,
}
