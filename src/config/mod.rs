//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, resolve relative roots)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!
//! While serving:
//!     watcher.rs detects a change under the routes root
//!     → ReloadEvent::Rebuild (layout changed) or ::Invalidate (contents changed)
//!     → FsRouter::reload / FsRouter::invalidate
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the route table is hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, RouterConfig, RoutesConfig, StaticFilesConfig,
    TimeoutConfig,
};
pub use watcher::{ReloadEvent, RouteWatcher};
