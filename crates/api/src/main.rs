use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use taskboard_core::lifecycle::ServiceRegistry;
use taskboard_db::DatabaseService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard_api::bootstrap::{build_state, register_services, seed_if_enabled};
use taskboard_api::config::{LogFormat, ServerConfig};
use taskboard_api::router::build_app_router;
use taskboard_api::shutdown::{install_panic_hook, ShutdownTrigger};

#[tokio::main]
async fn main() -> ExitCode {
    let started_at = Instant::now();
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_api=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = %config.environment,
        "Loaded server configuration"
    );

    // --- Panic handling ---
    let trigger = ShutdownTrigger::new();
    install_panic_hook(trigger.clone());

    // --- Services ---
    let database = match DatabaseService::connect_lazy(&config.database_url) {
        Ok(database) => database,
        Err(e) => {
            tracing::error!(error = %e, "Invalid database configuration");
            return ExitCode::FAILURE;
        }
    };

    let config = Arc::new(config);
    let mut registry = ServiceRegistry::new();
    let keys = match register_services(&mut registry, Arc::clone(&config), database) {
        Ok(keys) => keys,
        Err(e) => {
            tracing::error!(error = %e, "Service registration failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = registry.start().await {
        tracing::error!(error = %e, "Service startup failed");
        return ExitCode::FAILURE;
    }
    tracing::info!(order = ?registry.initialization_order(), "Services started");

    let state = match build_state(registry, &keys, started_at) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build application state");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = seed_if_enabled(&state).await {
        tracing::error!(error = %e, "Development seeding failed");
        stop_services(&state, &config).await;
        return ExitCode::FAILURE;
    }

    // --- Router ---
    let app = build_app_router(state.clone(), &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            stop_services(&state, &config).await;
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "Starting server");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(trigger.clone()))
        .await;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let stopped = stop_services(&state, &config).await;

    if let Err(e) = served {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    if trigger.has_failed() || !stopped {
        return ExitCode::FAILURE;
    }
    tracing::info!("Graceful shutdown complete");
    ExitCode::SUCCESS
}

/// Stop every service in reverse start order. Returns `false` when the
/// teardown overran `SHUTDOWN_TIMEOUT_SECS`.
async fn stop_services(state: &taskboard_api::state::AppState, config: &ServerConfig) -> bool {
    let timeout = Duration::from_secs(config.shutdown_timeout_secs);
    match state.registry.write().await.shutdown(timeout).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Service shutdown incomplete");
            false
        }
    }
}

/// Wait for SIGINT, SIGTERM, or an internal shutdown request.
async fn shutdown_signal(trigger: ShutdownTrigger) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
        () = trigger.triggered() => {
            tracing::warn!(failed = trigger.has_failed(), "Shutdown requested internally");
        }
    }
}
