//! Routes directory watcher for hot reload.

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::routing::builder::is_excluded_name;

/// What a change in the routes directory requires of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Files were added, removed or renamed: rebuild the route table.
    Rebuild,
    /// File contents changed: drop cached lookups and handlers.
    Invalidate,
}

impl ReloadEvent {
    /// Map a file-system event to the reload it requires, if any.
    pub fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) | EventKind::Remove(_) => Some(Self::Rebuild),
            EventKind::Modify(ModifyKind::Name(_)) => Some(Self::Rebuild),
            EventKind::Modify(_) => Some(Self::Invalidate),
            _ => None,
        }
    }

    /// Map an event under `root` to the reload it requires. Events that only
    /// touch files the route builder skips require none.
    pub fn from_event(event: &Event, root: &Path) -> Option<Self> {
        let reload = Self::from_kind(&event.kind)?;
        if !event.paths.is_empty() && event.paths.iter().all(|path| is_ignored(path, root)) {
            return None;
        }
        Some(reload)
    }
}

/// True if `path` lies under `root` below an excluded file or directory.
fn is_ignored(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_str().map_or(true, is_excluded_name),
        _ => false,
    })
}

/// A watcher that monitors the routes directory for changes.
pub struct RouteWatcher {
    path: PathBuf,
    events: mpsc::UnboundedSender<ReloadEvent>,
}

impl RouteWatcher {
    /// Create a new RouteWatcher sending to `events`.
    pub fn new(path: &Path, events: mpsc::UnboundedSender<ReloadEvent>) -> Self {
        Self {
            path: path.to_path_buf(),
            events,
        }
    }

    /// Start watching in a background thread. The watch stops when the
    /// returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.events.clone();
        let root = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(reload) = ReloadEvent::from_event(&event, &root) {
                        tracing::debug!(paths = ?event.paths, reload = ?reload, "Routes directory changed");
                        let _ = tx.send(reload);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.path, "Routes watcher started");
        Ok(watcher)
    }
}
