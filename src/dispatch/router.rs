//! Router state: the published route table and its caches.
//!
//! # Design Decisions
//! - A generation bundles a route table with the caches derived from it, so
//!   publishing a new table and emptying both caches is one atomic store
//! - Requests load the current generation once and finish on it even if a
//!   reload lands mid-flight
//! - Reloads are serialized; a failed reload leaves the previous generation
//!   in place

use arc_swap::ArcSwap;
use axum::http::Method;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cache::BoundedCache;
use crate::config::RoutesConfig;
use crate::dispatch::static_files::StaticFallback;
use crate::error::{BuildError, LookupError};
use crate::handler::{Handler, ModuleLoader};
use crate::observability::metrics;
use crate::routing::{scan, RouteFile, RouteMatch, RouteTable};

/// A route table and the caches that are only valid for it.
pub(crate) struct Generation {
    table: RouteTable,
    lookups: BoundedCache<Option<RouteMatch<RouteFile>>>,
    handlers: BoundedCache<Option<Handler>>,
}

impl Generation {
    fn new(table: RouteTable, settings: &RoutesConfig) -> Self {
        let (lookups, handlers) = if settings.development {
            (
                BoundedCache::bypassed("lookup"),
                BoundedCache::bypassed("handler"),
            )
        } else {
            (
                BoundedCache::new("lookup", settings.cache_capacity),
                BoundedCache::new("handler", settings.cache_capacity),
            )
        };
        Self {
            table,
            lookups,
            handlers,
        }
    }

    pub(crate) fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Match `path` for `method`, memoized by `path:method`.
    pub(crate) async fn resolve(
        &self,
        loader: &dyn ModuleLoader,
        path: &str,
        method: &Method,
    ) -> Result<Option<RouteMatch<RouteFile>>, LookupError> {
        let key = format!("{path}:{method}");
        self.lookups
            .try_get_or_insert_with(key, || {
                self.table.trie().lookup(path, move |file: &RouteFile| {
                    let file = file.clone();
                    async move { self.handler(loader, &file, method).await.is_some() }
                })
            })
            .await
    }

    /// The handler `file` exports for `method`, memoized by `file:method`.
    ///
    /// Load failures are logged and remembered as "no handler".
    pub(crate) async fn handler(
        &self,
        loader: &dyn ModuleLoader,
        file: &RouteFile,
        method: &Method,
    ) -> Option<Handler> {
        let key = format!("{}:{method}", file.path().display());
        self.handlers
            .get_or_insert_with(key, || async {
                match loader.load(file).await {
                    Ok(Some(module)) => module.resolve(method),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!(file = %file, method = %method, error = %e, "Failed to load route module");
                        None
                    }
                }
            })
            .await
    }

    fn clear(&self) {
        self.lookups.clear();
        self.handlers.clear();
    }
}

/// File-system driven request router.
pub struct FsRouter {
    settings: RoutesConfig,
    pub(crate) loader: Arc<dyn ModuleLoader>,
    pub(crate) fallback: Option<Arc<dyn StaticFallback>>,
    current: ArcSwap<Generation>,
    reload_lock: Mutex<()>,
}

impl FsRouter {
    /// Build the initial route table. Fails if the routes directory cannot be
    /// turned into a valid table.
    pub async fn new(
        settings: RoutesConfig,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self, BuildError> {
        let table = scan(settings.root.clone(), settings.extensions.clone()).await?;
        metrics::record_route_count(table.len());
        let generation = Generation::new(table, &settings);

        Ok(Self {
            settings,
            loader,
            fallback: None,
            current: ArcSwap::from_pointee(generation),
            reload_lock: Mutex::new(()),
        })
    }

    /// Offer unmatched requests to `fallback` before answering 404.
    pub fn with_static_files(mut self, fallback: Arc<dyn StaticFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn settings(&self) -> &RoutesConfig {
        &self.settings
    }

    pub(crate) fn generation(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    /// Rebuild the route table from disk and publish it with empty caches.
    ///
    /// Returns the new route count. On failure the current table stays live.
    pub async fn reload(&self) -> Result<usize, BuildError> {
        let _guard = self.reload_lock.lock().await;

        match scan(self.settings.root.clone(), self.settings.extensions.clone()).await {
            Ok(table) => {
                let routes = table.len();
                self.current
                    .store(Arc::new(Generation::new(table, &self.settings)));
                metrics::record_reload(true);
                metrics::record_route_count(routes);
                tracing::info!(routes, "Route table reloaded");
                Ok(routes)
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::error!(error = %e, "Route table reload failed, keeping previous table");
                Err(e)
            }
        }
    }

    /// Drop every cached lookup and handler of the current table.
    pub fn invalidate(&self) {
        self.current.load().clear();
        tracing::debug!("Route caches invalidated");
    }

    /// `(pattern, file)` pairs of the current table in matching priority order.
    pub fn routes(&self) -> Vec<(String, RouteFile)> {
        self.current.load().table().routes()
    }
}
