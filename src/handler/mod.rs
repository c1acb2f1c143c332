//! Route handlers and route modules.
//!
//! # Data Flow
//! ```text
//! RouteFile (matched target)
//!     → ModuleLoader::load (registry lookup, manifest parse, ...)
//!     → RouteModule (handlers "exported" per HTTP method)
//!     → RouteModule::resolve(method) (HEAD falls back to GET)
//!     → Handler(request, params) → Response
//! ```
//!
//! # Design Decisions
//! - Loading is a capability injected into the router, not hardwired
//! - A missing export and a failed load both mean "no handler"

pub mod manifest;
pub mod registry;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::LoadError;
use crate::routing::{Params, RouteFile};

pub use manifest::ManifestLoader;
pub use registry::RegistryLoader;

/// Methods a route module may export.
pub const SUPPORTED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

pub fn is_supported(method: &Method) -> bool {
    SUPPORTED_METHODS.contains(method)
}

/// A request handler bound to a route.
pub type Handler = Arc<dyn Fn(Request<Body>, Params) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async function as a `Handler`.
pub fn handler<F, Fut, R>(f: F) -> Handler
where
    F: Fn(Request<Body>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |request, params| {
        let fut = f(request, params);
        async move { fut.await.into_response() }.boxed()
    })
}

/// The handlers exported by one route file.
#[derive(Clone, Default)]
pub struct RouteModule {
    handlers: HashMap<Method, Handler>,
}

impl RouteModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `handler` for `method`, replacing any previous export.
    pub fn with(mut self, method: Method, handler: Handler) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    pub fn get(self, handler: Handler) -> Self {
        self.with(Method::GET, handler)
    }

    pub fn head(self, handler: Handler) -> Self {
        self.with(Method::HEAD, handler)
    }

    pub fn post(self, handler: Handler) -> Self {
        self.with(Method::POST, handler)
    }

    pub fn put(self, handler: Handler) -> Self {
        self.with(Method::PUT, handler)
    }

    pub fn delete(self, handler: Handler) -> Self {
        self.with(Method::DELETE, handler)
    }

    pub fn patch(self, handler: Handler) -> Self {
        self.with(Method::PATCH, handler)
    }

    /// The handler exported for exactly `method`.
    pub fn export(&self, method: &Method) -> Option<Handler> {
        self.handlers.get(method).cloned()
    }

    /// The handler serving `method`; `HEAD` falls back to the `GET` export.
    pub fn resolve(&self, method: &Method) -> Option<Handler> {
        self.export(method).or_else(|| {
            if *method == Method::HEAD {
                self.export(&Method::GET)
            } else {
                None
            }
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.handlers.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for RouteModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("RouteModule").field("methods", &methods).finish()
    }
}

/// Resolves route files into route modules.
///
/// `Ok(None)` means the file exports nothing the loader understands.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, file: &RouteFile) -> Result<Option<Arc<RouteModule>>, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn text(body: &'static str) -> Handler {
        handler(move |_req: Request<Body>, _params: Params| async move { body })
    }

    async fn call(handler: Handler) -> String {
        let response = handler(Request::new(Body::empty()), Params::new()).await;
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_head_falls_back_to_get() {
        let module = RouteModule::new().get(text("get"));

        assert!(module.export(&Method::HEAD).is_none());
        let head = module.resolve(&Method::HEAD).unwrap();
        assert_eq!(call(head).await, "get");
        assert!(module.resolve(&Method::POST).is_none());
    }

    #[tokio::test]
    async fn test_explicit_head_wins() {
        let module = RouteModule::new().get(text("get")).head(text("head"));
        assert_eq!(call(module.resolve(&Method::HEAD).unwrap()).await, "head");
    }

    #[test]
    fn test_supported_methods() {
        assert!(is_supported(&Method::PATCH));
        assert!(!is_supported(&Method::OPTIONS));
        assert!(!is_supported(&Method::TRACE));
        assert!(!is_supported(&Method::CONNECT));
    }

    #[test]
    fn test_debug_lists_methods() {
        let module = RouteModule::new().post(text("p")).get(text("g"));
        assert_eq!(format!("{module:?}"), r#"RouteModule { methods: ["GET", "POST"] }"#);
    }
}
