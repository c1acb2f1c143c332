//! Error types shared across the router.
//!
//! # Taxonomy
//! - `RouteError`: a route layout that cannot be represented (raised while inserting)
//! - `BuildError`: a route table (re)build that had to be abandoned
//! - `LookupError`: a defect in an already-built table detected while matching
//! - `LoadError`: a route module that could not be loaded (recovered as "no handler")
//! - `StartupError`: anything that stops the binary from coming up

use std::path::PathBuf;
use thiserror::Error;

/// Route layout violations detected while inserting into the trie.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Duplicate route '{pattern}': '{existing}' and '{incoming}' resolve to the same path")]
    DuplicateRoute {
        pattern: String,
        existing: String,
        incoming: String,
    },

    #[error("Catch-all must be the last part of the URL ('{path}')")]
    CatchAllNotLast { path: String },

    #[error("Detected a three-dot character ('…') in '{segment}'. Did you mean ('...')?")]
    EllipsisTypo { segment: String },

    #[error("Segment names may not start or end with extra brackets ('{name}')")]
    ExtraBrackets { name: String },

    #[error("Segment names may not start with erroneous periods ('{name}')")]
    LeadingPeriod { name: String },

    #[error("Segment names may not be empty ('{segment}')")]
    EmptySlugName { segment: String },

    #[error("Optional route parameters are not supported ('{segment}'), use '[[...name]]'")]
    OptionalParamUnsupported { segment: String },

    #[error("You cannot use different slug names for the same dynamic path ('{previous}' !== '{next}')")]
    SlugNameMismatch { previous: String, next: String },

    #[error("You cannot have the same slug name '{name}' repeat within a single dynamic path")]
    RepeatedSlug { name: String },

    #[error("You cannot have the slug names '{first}' and '{second}' differ only by non-word symbols within a single dynamic path")]
    SlugsDifferBySymbols { first: String, second: String },

    #[error("You cannot use both a required and optional catch-all route at the same level ('[...{existing}]' and '{segment}')")]
    RequiredAndOptionalCatchAll { existing: String, segment: String },

    #[error("You cannot use both an optional and required catch-all route at the same level ('[[...{existing}]]' and '{segment}')")]
    OptionalAndRequiredCatchAll { existing: String, segment: String },

    #[error("You cannot define a route with the same specificity as an optional catch-all route ('{pattern}' and '[[...{slug}]]')")]
    OptionalCatchAllSpecificity { pattern: String, slug: String },
}

/// A route table build that was abandoned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Routes directory {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("Failed to read routes directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid route file '{file}': {source}")]
    Conflict {
        file: String,
        #[source]
        source: RouteError,
    },

    #[error("Route table build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// An inconsistency found in a built table while matching a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Route '{pattern}' has the same specificity as optional catch-all '[[...{slug}]]'")]
    OptionalCatchAllSpecificity { pattern: String, slug: String },
}

/// Failure to turn a route file into a route module.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read route file '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid route manifest '{file}': {reason}")]
    Manifest { file: String, reason: String },
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to watch routes directory: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("Invalid address '{0}'")]
    Address(String),
}
