//! Route table construction from a directory tree.
//!
//! # Responsibilities
//! - Walk the routes directory and pick out route files
//! - Derive the canonical URL path of each file
//! - Insert every route into a fresh trie
//!
//! # File Conventions
//! - `index.<ext>` serves its parent directory
//! - names starting with `_` or `.` are skipped (directories are not descended)
//! - declaration files (`*.d.<ext>`) and test files (`*.test.<ext>`, `*_spec.<ext>`, ...) are skipped
//! - `(group)` directories organize files without adding a URL segment
//!
//! # Design Decisions
//! - A build either produces a complete table or fails; nothing is published half-built
//! - The walk is sorted so conflicts are reported deterministically

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

use crate::error::BuildError;
use crate::routing::trie::RouteTrie;

const TEST_SUFFIXES: &[&str] = &[".test", "_test", ".spec", "_spec", ".bench", "_bench"];

/// A route file: the resource a matched route resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteFile {
    path: Arc<Path>,
    relative: Arc<str>,
}

impl RouteFile {
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            path: Arc::from(path.into()),
            relative: Arc::from(relative.into()),
        }
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the routes root, `/`-separated (e.g. `users/[id].toml`).
    pub fn relative(&self) -> &str {
        &self.relative
    }
}

impl fmt::Display for RouteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

/// A fully built route table.
#[derive(Debug)]
pub struct RouteTable {
    root: PathBuf,
    trie: RouteTrie<RouteFile>,
}

impl RouteTable {
    /// An empty table, matching nothing.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            trie: RouteTrie::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trie(&self) -> &RouteTrie<RouteFile> {
        &self.trie
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Routes as `(pattern, file)` pairs in matching priority order.
    pub fn routes(&self) -> Vec<(String, RouteFile)> {
        self.trie
            .routes()
            .into_iter()
            .map(|(pattern, file)| (pattern, file.clone()))
            .collect()
    }
}

/// Build a route table from `root`, blocking on file-system access.
pub fn build_route_table(root: &Path, extensions: &[String]) -> Result<RouteTable, BuildError> {
    let root = root
        .canonicalize()
        .map_err(|_| BuildError::MissingRoot(root.to_path_buf()))?;
    if !root.is_dir() {
        return Err(BuildError::MissingRoot(root));
    }

    let mut trie = RouteTrie::new();
    let walker = WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!(path = %entry.path().display(), "Skipping route file with non UTF-8 name");
            continue;
        };
        if !is_route_file(name, extensions) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let Some(relative) = relative_path(relative) else {
            tracing::warn!(path = %entry.path().display(), "Skipping route file with non UTF-8 path");
            continue;
        };

        let url_path = url_path(&relative);
        let file = RouteFile::new(entry.path(), relative);
        tracing::debug!(route = %url_path, file = %file, "Registering route");

        trie.insert(&url_path, file.clone())
            .map_err(|source| BuildError::Conflict {
                file: file.to_string(),
                source,
            })?;
    }

    tracing::info!(root = %root.display(), routes = trie.len(), "Route table built");
    Ok(RouteTable { root, trie })
}

/// Build a route table on the blocking pool.
pub async fn scan(root: PathBuf, extensions: Vec<String>) -> Result<RouteTable, BuildError> {
    tokio::task::spawn_blocking(move || build_route_table(&root, &extensions)).await?
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.file_name().to_str().map_or(true, is_excluded_name)
}

/// Returns true if a file or directory named `name` is skipped along with
/// everything below it.
pub(crate) fn is_excluded_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Returns true if `file_name` is a route source file.
pub fn is_route_file(file_name: &str, extensions: &[String]) -> bool {
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return false;
    };
    if stem.is_empty() || !extensions.iter().any(|e| e == extension) {
        return false;
    }
    if stem.ends_with(".d") {
        return false;
    }
    !TEST_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
}

fn relative_path(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

/// Canonical URL path of a route file given its root-relative path.
///
/// The extension is stripped and a trailing `index` collapses to its parent.
/// Group segments are kept; the trie elides them when inserting.
pub fn url_path(relative: &str) -> String {
    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(last) = segments.pop() {
        let stem = last.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(last);
        if stem != "index" {
            segments.push(stem);
        }
    }
    format!("/{}", segments.join("/"))
}
