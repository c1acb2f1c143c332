//! File-system driven HTTP router.
//!
//! The directory tree under the routes root is the route table: every route
//! file becomes a URL pattern, with `[id]`, `[...path]`, `[[...path]]` and
//! `(group)` names marking dynamic segments, catch-alls and URL-less folders.

// Core subsystems
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::schema::RouterConfig;
pub use dispatch::{FsRouter, StaticFallback, StaticFiles};
pub use error::{BuildError, LoadError, LookupError, RouteError, StartupError};
pub use handler::{
    handler, Handler, ManifestLoader, ModuleLoader, RegistryLoader, RouteModule,
};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{ParamValue, Params, RouteFile, RouteMatch, RouteTable, RouteTrie};
