//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP rebuilds the route table, not shutdown

use tokio::sync::mpsc;

use crate::config::ReloadEvent;
use crate::lifecycle::Shutdown;

/// Wait for signals until a shutdown signal arrives, then trigger `shutdown`.
pub async fn listen(shutdown: Shutdown, reloads: mpsc::UnboundedSender<ReloadEvent>) {
    wait_for_shutdown(reloads).await;
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_shutdown(reloads: mpsc::UnboundedSender<ReloadEvent>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut terminate, mut hangup) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(terminate), Ok(hangup)) => (terminate, hangup),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Failed to install signal handlers, only Ctrl+C is handled");
            ctrl_c().await;
            return;
        }
    };

    loop {
        tokio::select! {
            _ = ctrl_c() => break,
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received");
                break;
            }
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, rebuilding route table");
                let _ = reloads.send(ReloadEvent::Rebuild);
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_reloads: mpsc::UnboundedSender<ReloadEvent>) {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl+C received");
}
