//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Start background tasks (metrics, routes watcher, signals)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, including an invalid route table
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{RouteWatcher, RouterConfig};
use crate::dispatch::{FsRouter, StaticFiles};
use crate::error::{BuildError, StartupError};
use crate::handler::ModuleLoader;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Build the router described by `config`, including its static fallback.
pub async fn build_router(
    config: &RouterConfig,
    loader: Arc<dyn ModuleLoader>,
) -> Result<FsRouter, BuildError> {
    let mut router = FsRouter::new(config.routes.clone(), loader).await?;
    if let Some(static_files) = &config.static_files {
        router = router.with_static_files(Arc::new(StaticFiles::new(
            static_files.root.clone(),
            static_files.prefix.clone(),
        )));
    }
    Ok(router)
}

/// Start every subsystem and serve until a shutdown signal arrives.
pub async fn run(config: RouterConfig, loader: Arc<dyn ModuleLoader>) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes_root = %config.routes.root.display(),
        prefix = %config.routes.prefix,
        development = config.routes.development,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let router = Arc::new(build_router(&config, loader).await?);
    for (pattern, file) in router.routes() {
        tracing::debug!(route = %pattern, file = %file, "Route registered");
    }

    let (reload_tx, reload_rx) = mpsc::unbounded_channel();

    // Dropping the watcher stops it, so it lives until the server returns.
    let _watcher = if config.routes.watch {
        Some(RouteWatcher::new(&config.routes.root, reload_tx.clone()).run()?)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::listen(shutdown, reload_tx));

    HttpServer::new(router, &config)
        .run(listener, reload_rx, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
