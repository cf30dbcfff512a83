//! Evacuation planning API server.
//!
//! Registers zones and vehicles, generates vehicle-to-zone plans, and tracks
//! how many people have left each zone.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rescue_evac_api::{
    api,
    config::{self, StorageBackend},
    db::Database,
    repository::Repositories,
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to EVAC_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting evacuation API");
    info!(
        listen_addr = %config.listen_addr,
        storage = ?config.storage,
        "Configuration loaded"
    );

    let repos = match config.storage {
        StorageBackend::Memory => Repositories::in_memory(),
        StorageBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => db,
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.dev_mode {
                info!("Running database migrations (dev mode)");
                if let Err(e) = db.run_migrations().await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            Repositories::from_store(Arc::new(db.store()))
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = api::create_router(AppState::new(repos));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            true
        }
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
            false
        }
    };

    if interrupted {
        let _ = shutdown_tx.send(true);
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, server_handle)
            .await
            .is_err()
        {
            warn!("HTTP server did not drain in time");
        }
    }

    info!("Evacuation API shutdown complete");
    Ok(())
}
