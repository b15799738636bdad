//! Orchestra API Server Entry Point
//!
//! Bootstraps configuration, opens the configured store, and serves the
//! Axum HTTP server until Ctrl+C or SIGTERM, draining in-flight requests.

use std::net::SocketAddr;
use std::sync::Arc;

use orchestra_api::jobs::{activity_feed_task, ActivityFeedConfig};
use orchestra_api::shutdown::{shutdown_on_signal, wait_for_shutdown};
use orchestra_api::telemetry::init_tracing;
use orchestra_api::{
    create_api_router, seed_store, ApiConfig, ApiError, ApiResult, AppState, DbConfig, LogFormat,
    PgStore, ServerConfig, StoreKind,
};
use orchestra_storage::{InMemoryStore, Store};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(LogFormat::from_env())?;

    let server_config = ServerConfig::from_env()?;
    let api_config = ApiConfig::from_env();
    if server_config.is_production() {
        api_config.validate_for_production()?;
    }

    let store = open_store(&server_config).await?;

    if server_config.seed_on_start {
        let outcome = seed_store(store.as_ref()).await?;
        tracing::info!(?outcome, "Startup seeding finished");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_rx_server = shutdown_rx.clone();
    let feed_config = ActivityFeedConfig::from_env();
    let feed_handle = feed_config
        .enabled
        .then(|| tokio::spawn(activity_feed_task(store.clone(), feed_config, shutdown_rx)));

    let app = create_api_router(AppState::new(store), &api_config)?;

    let addr = server_config.bind_addr()?;
    tracing::info!(%addr, store = ?server_config.store, "Starting Orchestra API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let signal_handle = tokio::spawn(shutdown_on_signal(shutdown_tx.clone()));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_shutdown(shutdown_rx_server))
    .await
    .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    signal_handle.abort();
    let _ = shutdown_tx.send(true);
    if let Some(handle) = feed_handle {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Activity feed task did not stop cleanly");
        }
    }

    Ok(())
}

async fn open_store(config: &ServerConfig) -> ApiResult<Arc<dyn Store>> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreKind::Postgres => {
            let db_config = DbConfig::from_env();
            tracing::info!(
                host = %db_config.host,
                port = db_config.port,
                dbname = %db_config.dbname,
                "Connecting to PostgreSQL"
            );
            let store = PgStore::from_config(&db_config)?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}
