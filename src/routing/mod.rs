//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Table Build (startup and reload):
//!     routes directory
//!     → builder.rs (walk, filter, canonical URL path per file)
//!     → segment.rs (classify literal / slug / catch-all / group)
//!     → trie.rs (insert with conflict detection)
//!     → RouteTable (immutable, published whole)
//!
//! Incoming Request (normalized path):
//!     → trie.rs (lookup, priority literal > slug > catch-all > optional catch-all)
//!     → validity predicate (does the target export a handler for the method?)
//!     → Return: RouteMatch { target, params } or no match
//! ```
//!
//! # Design Decisions
//! - Routes come from the file tree only, never from registration order
//! - Layout conflicts fail the build instead of being resolved by precedence
//! - No regex in the hot path (segment-by-segment descent)

pub mod builder;
pub mod params;
pub mod segment;
pub mod trie;

pub use builder::{build_route_table, scan, RouteFile, RouteTable};
pub use params::{ParamValue, Params};
pub use trie::{RouteMatch, RouteTrie};
