//! Result caching subsystem.
//!
//! # Instances
//! ```text
//! lookup cache:  "<path>:<method>"   → Option<RouteMatch>  (trie lookups)
//! handler cache: "<file>:<method>"   → Option<Handler>     (module loads)
//! ```
//!
//! Both live inside a route table generation and are dropped with it on reload.

pub mod lru;

pub use lru::BoundedCache;
