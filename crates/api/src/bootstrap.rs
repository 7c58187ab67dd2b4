//! Service wiring shared by `main.rs` and the integration tests.
//!
//! Registers every long-lived service with the [`ServiceRegistry`] and,
//! once the registry has started, builds [`AppState`] from the started
//! instances.
//!
//! ```text
//! config
//!   └── database
//! event_bus
//! task_engine  (database, event_bus)
//! realtime     (task_engine, event_bus)
//! ```

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use taskboard_core::lifecycle::{
    LifecycleError, Service, ServiceKey, ServiceOptions, ServiceRegistry,
};
use taskboard_db::seed::{seed_dev_data, SeedReport};
use taskboard_db::DatabaseService;
use taskboard_events::EventBus;
use tokio::sync::RwLock;

use crate::auth::password::hash_password;
use crate::config::ServerConfig;
use crate::engine::TaskEngine;
use crate::state::AppState;
use crate::ws::RealtimeService;

pub const CONFIG: &str = "config";
pub const DATABASE: &str = "database";
pub const EVENT_BUS: &str = "event_bus";
pub const TASK_ENGINE: &str = "task_engine";
pub const REALTIME: &str = "realtime";

#[async_trait]
impl Service for ServerConfig {}

/// Handles to every registered service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceKeys {
    pub config: ServiceKey<ServerConfig>,
    pub database: ServiceKey<DatabaseService>,
    pub event_bus: ServiceKey<EventBus>,
    pub task_engine: ServiceKey<TaskEngine>,
    pub realtime: ServiceKey<RealtimeService>,
}

/// Register the application's services. Nothing is constructed until
/// [`ServiceRegistry::start`].
pub fn register_services(
    registry: &mut ServiceRegistry,
    config: Arc<ServerConfig>,
    database: DatabaseService,
) -> Result<ServiceKeys, LifecycleError> {
    let config = registry.value(CONFIG, config, ServiceOptions::new())?;

    let database = registry.value(
        DATABASE,
        Arc::new(database),
        ServiceOptions::new().depends_on([CONFIG]),
    )?;

    let event_bus =
        registry.singleton(EVENT_BUS, |_| Ok(EventBus::default()), ServiceOptions::new())?;

    let task_engine = registry.singleton(
        TASK_ENGINE,
        move |resolver| {
            let db = resolver.get(database)?;
            Ok(TaskEngine::new(db.pool().clone(), resolver.get(event_bus)?))
        },
        ServiceOptions::new().depends_on([DATABASE, EVENT_BUS]),
    )?;

    let realtime = registry.singleton(
        REALTIME,
        move |resolver| {
            Ok(RealtimeService::new(
                resolver.get(task_engine)?,
                resolver.get(event_bus)?,
            ))
        },
        ServiceOptions::new()
            .depends_on([TASK_ENGINE, EVENT_BUS])
            .disposer(|realtime: Arc<RealtimeService>| async move {
                let connections = realtime.ws_manager().connection_count().await;
                tracing::info!(connections, "Closing realtime connections");
                Ok::<(), LifecycleError>(())
            }),
    )?;

    Ok(ServiceKeys {
        config,
        database,
        event_bus,
        task_engine,
        realtime,
    })
}

/// Build the handler state from a started registry.
///
/// The registry moves into the state so `/health` can query it; `main`
/// reaches it again through [`AppState::registry`] for shutdown.
pub fn build_state(
    registry: ServiceRegistry,
    keys: &ServiceKeys,
    started_at: Instant,
) -> Result<AppState, LifecycleError> {
    let config = registry.resolve(keys.config)?;
    let database = registry.resolve(keys.database)?;
    let event_bus = registry.resolve(keys.event_bus)?;
    let engine = registry.resolve(keys.task_engine)?;
    let realtime = registry.resolve(keys.realtime)?;

    Ok(AppState {
        pool: database.pool().clone(),
        config,
        ws_manager: realtime.ws_manager(),
        event_bus,
        engine,
        registry: Arc::new(RwLock::new(registry)),
        started_at,
    })
}

/// Insert sample data into an empty database when `SEED_DEV_DATA` is set.
pub async fn seed_if_enabled(state: &AppState) -> Result<Option<SeedReport>, LifecycleError> {
    if !state.config.seed_dev_data {
        return Ok(None);
    }

    let password_hash =
        hash_password(&state.config.seed_admin_password).map_err(LifecycleError::service)?;
    let report = seed_dev_data(&state.pool, &password_hash)
        .await
        .map_err(LifecycleError::service)?;

    tracing::info!(
        users = report.users,
        projects = report.projects,
        "Development data seeded"
    );
    Ok(Some(report))
}
