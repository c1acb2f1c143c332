//! In-process route modules keyed by route file.
//!
//! The routes directory decides which URLs exist; the registry supplies the
//! code behind each file. A file with no registered module has no handlers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LoadError;
use crate::handler::{ModuleLoader, RouteModule};
use crate::routing::RouteFile;

/// Loader backed by modules registered in code.
#[derive(Debug, Clone, Default)]
pub struct RegistryLoader {
    modules: HashMap<String, Arc<RouteModule>>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module for a route file, keyed by its path relative to
    /// the routes root (`users/[id].rs`).
    pub fn register(mut self, relative: impl Into<String>, module: RouteModule) -> Self {
        let relative = relative.into();
        let relative = relative.trim_start_matches('/').to_string();
        self.modules.insert(relative, Arc::new(module));
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl ModuleLoader for RegistryLoader {
    async fn load(&self, file: &RouteFile) -> Result<Option<Arc<RouteModule>>, LoadError> {
        let module = self.modules.get(file.relative()).cloned();
        if module.is_none() {
            tracing::debug!(file = %file, "No module registered for route file");
        }
        Ok(module)
    }
}
