//! Scrape-Indexer: capture rendered web pages and index them for search
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use scrape_indexer::{
    config, logging,
    web::{create_router, AppState},
    Pipeline,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings_path = config::locate()?;
    let settings = config::load_from(settings_path.as_deref())?;

    // Initialize logging
    let _log_guard = logging::init(&settings)?;
    info!(
        "Starting Scrape-Indexer v{} ({})",
        scrape_indexer::VERSION,
        settings.general.environment
    );
    match &settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    // Bind before any browser session exists
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Connect to the search engine and the browser endpoint
    let pipeline = Pipeline::start(&settings)
        .await
        .context("failed to start the scrape pipeline")?;
    let pipeline = Arc::new(pipeline);
    info!(
        "Pipeline ready: {} browser session(s) at {}, search engine at {}",
        settings.dispatcher.pool_size, settings.browser.remote_url, settings.search_engine.url
    );

    // Create router
    let app = create_router(AppState::new(settings, pipeline.clone()));

    info!("Starting server on http://{}", addr);

    // Start server
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pipeline.shutdown().await;
    info!("Server stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
