//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route discovery and caching.
    pub routes: RoutesConfig,

    /// Optional static file fallback.
    pub static_files: Option<StaticFilesConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutesConfig {
    /// Directory holding the route files. Relative paths are resolved
    /// against the config file's directory.
    pub root: PathBuf,

    /// URL prefix the routes are mounted under (e.g. "/api"), empty for none.
    pub prefix: String,

    /// Extensions of route files, without the leading dot.
    pub extensions: Vec<String>,

    /// Skip both caches so every request sees the files as they are now.
    pub development: bool,

    /// Entries per cache (lookups and handlers).
    pub cache_capacity: usize,

    /// Rebuild the route table when the routes directory changes.
    pub watch: bool,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("routes"),
            prefix: String::new(),
            extensions: vec!["toml".to_string()],
            development: false,
            cache_capacity: 1024,
            watch: true,
        }
    }
}

/// Static file fallback for requests no route matched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StaticFilesConfig {
    /// Directory to serve.
    pub root: PathBuf,

    /// URL prefix the files are served under.
    #[serde(default)]
    pub prefix: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
