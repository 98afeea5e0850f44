//! SchoolHub Server: school management and credit ledger backend
//!
//! Main entry point that wires all crates together and starts the server.
//! Pass `--memory` to run against the in-memory store instead of PostgreSQL.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use schoolhub_api::AppState;
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_database::{DatabasePool, Stores, migration};
use schoolhub_service::{LocalArtifactStore, ServiceRegistry};
use schoolhub_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("SCHOOLHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    let in_memory = std::env::args().skip(1).any(|arg| arg == "--memory");
    if let Err(e) = run(config, in_memory).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Main server run function
async fn run(config: AppConfig, in_memory: bool) -> Result<(), AppError> {
    tracing::info!("Starting SchoolHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, db_pool) = if in_memory {
        tracing::warn!("Using the in-memory store; data is lost on exit");
        (Stores::memory(), None)
    } else {
        config.require_database_url()?;
        let pool = DatabasePool::connect(&config.database).await?;
        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            migration::run_migrations(pool.pool()).await?;
            tracing::info!("Database migrations complete");
        }
        (Stores::postgres(pool.pool().clone()), Some(pool))
    };

    // ── Step 2: Artifact storage ─────────────────────────────────
    let artifacts = LocalArtifactStore::from_config(&config.storage, &config.supabase).await?;
    tracing::info!(root = %config.storage.root_path, "Artifact storage ready");

    // ── Step 3: Services ─────────────────────────────────────────
    let services = ServiceRegistry::new(&stores, &config, Arc::new(artifacts));

    // ── Step 4: Background worker ────────────────────────────────
    let scheduler = if config.worker.enabled {
        let executor = schoolhub_worker::default_executor(&services, &config);
        let scheduler = CronScheduler::new(Arc::new(executor)).await?;
        scheduler.register_default_tasks(&config.worker).await?;
        scheduler.start().await?;
        tracing::info!("Background worker started");
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(Arc::new(config), services, stores.health.clone());
    schoolhub_api::serve(state, shutdown_rx).await?;

    // ── Step 6: Wait for background tasks ────────────────────────
    if let Some(scheduler) = scheduler {
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(Err(e)) => tracing::warn!("Scheduler shutdown failed: {}", e),
            Err(_) => tracing::warn!("Scheduler did not stop within {:?}", grace),
            Ok(Ok(())) => {}
        }
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("SchoolHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
