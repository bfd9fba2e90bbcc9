//! Nav Cache - HTTP front for the slug resolution and existence cache layer

use std::fs;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nav_cache::api::create_router;
use nav_cache::resolver::InMemoryCatalog;
use nav_cache::{spawn_sweep_task, AppState, Config};

/// Main entry point for the resolution server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the entity catalog, if one is configured
/// 4. Open the bounded store and wire the resolver and prefetcher
/// 5. Start the background in-flight sweep task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nav_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Nav Cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}B, existence_ttl={}s, inflight_window={}s, port={}, sweep_interval={}s",
        config.capacity_bytes,
        config.existence_ttl,
        config.inflight_window,
        config.server_port,
        config.sweep_interval
    );

    let catalog = match &config.catalog_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog {}", path.display()))?;
            InMemoryCatalog::from_json(&raw)
                .with_context(|| format!("Failed to parse catalog {}", path.display()))?
        }
        None => {
            warn!("CATALOG_PATH not set, serving an empty catalog");
            InMemoryCatalog::new()
        }
    };
    info!(
        "Catalog loaded: {} projects, {} documents",
        catalog.project_count(),
        catalog.document_count()
    );

    let state = AppState::from_config(&config, catalog).context("Failed to initialize state")?;
    match &config.storage_path {
        Some(path) => info!("Bounded store persisted at {}", path.display()),
        None => info!("Bounded store kept in memory"),
    }

    let store = state.store.clone();
    let sweep_handle = spawn_sweep_task(
        state.prefetcher.guard().clone(),
        store.clone(),
        config.sweep_interval(),
    );
    info!("Background sweep task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("Server error")?;

    let flushed = tokio::task::spawn_blocking(move || store.blocking_write().flush())
        .await
        .context("Final store flush failed")?;
    if flushed {
        info!("Store recency flushed");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Sweep task aborted");
}
