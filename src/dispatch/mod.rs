//! Request dispatch.
//!
//! # Responsibilities
//! - Validate method and URL length
//! - Decode and normalize the request path
//! - Resolve the route through the caches and the trie
//! - Invoke the handler, the static fallback, or answer 404
//! - Publish rebuilt route tables
//!
//! # Design Decisions
//! - Malformed requests become status responses, never errors
//! - The trie never loads modules itself; the router hands it a predicate
//!   backed by the handler cache

pub mod dispatcher;
pub mod path;
pub mod router;
pub mod static_files;

pub use dispatcher::MAX_URL_LENGTH;
pub use router::FsRouter;
pub use static_files::{StaticFallback, StaticFiles};
