//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router forwarding every request to the file-system router
//! - Wire up middleware (timeout, tracing, request ID)
//! - Bind server to listener
//! - Apply route table reloads while serving

use axum::{body::Body, extract::State, http::Request, response::Response, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ReloadEvent, RouterConfig};
use crate::dispatch::FsRouter;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// HTTP server for the file-system router.
pub struct HttpServer {
    app: Router,
    router: Arc<FsRouter>,
}

impl HttpServer {
    /// Create a new HTTP server around `router`.
    pub fn new(router: Arc<FsRouter>, config: &RouterConfig) -> Self {
        let app = Self::build_router(config, Arc::clone(&router));
        Self { app, router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, router: Arc<FsRouter>) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(router)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Reload events are applied to the router meanwhile.
    pub async fn run(
        self,
        listener: TcpListener,
        reloads: mpsc::UnboundedReceiver<ReloadEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.router.routes().len(),
            "HTTP server starting"
        );

        let reloader = tokio::spawn(apply_reloads(Arc::clone(&self.router), reloads));

        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        reloader.abort();
        result?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward a request to the file-system router.
async fn dispatch(State(router): State<Arc<FsRouter>>, request: Request<Body>) -> Response {
    router.handle(request).await
}

/// Apply reload events until the channel closes.
///
/// Bursts of events (an editor saving several files) collapse into a single
/// rebuild or invalidation.
pub async fn apply_reloads(router: Arc<FsRouter>, mut reloads: mpsc::UnboundedReceiver<ReloadEvent>) {
    while let Some(first) = reloads.recv().await {
        let mut event = first;
        while let Ok(next) = reloads.try_recv() {
            if next == ReloadEvent::Rebuild {
                event = ReloadEvent::Rebuild;
            }
        }

        match event {
            // Failures are logged by the router and the old table stays live.
            ReloadEvent::Rebuild => {
                let _ = router.reload().await;
            }
            ReloadEvent::Invalidate => router.invalidate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutesConfig;
    use crate::handler::RegistryLoader;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_apply_reloads_rebuilds_table() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.toml"), "").unwrap();
        let settings = RoutesConfig {
            root: dir.path().to_path_buf(),
            ..RoutesConfig::default()
        };
        let router = Arc::new(
            FsRouter::new(settings, Arc::new(RegistryLoader::new()))
                .await
                .unwrap(),
        );

        std::fs::write(dir.path().join("b.toml"), "").unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ReloadEvent::Invalidate).unwrap();
        tx.send(ReloadEvent::Rebuild).unwrap();
        drop(tx);

        apply_reloads(Arc::clone(&router), rx).await;
        assert_eq!(router.routes().len(), 2);
    }
}
