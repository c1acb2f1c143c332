//! Path segment trie.
//!
//! # Responsibilities
//! - Store routes keyed by path segment
//! - Reject ambiguous or malformed layouts while inserting
//! - Resolve a request path to the most specific acceptable route
//!
//! # Matching Priority
//! At every level, for the next request segment:
//! 1. literal child with the same text
//! 2. dynamic slug child (`[id]`)
//! 3. required catch-all child (`[...path]`), binds all remaining segments
//! 4. optional catch-all child (`[[...path]]`), binds all remaining segments
//!
//! The first branch producing an accepted target wins. A node holds at most
//! one child of each dynamic kind, so ties cannot happen.
//!
//! # Design Decisions
//! - Acceptability of a target is an injected async predicate, so matching
//!   stays independent of how targets become handlers
//! - Plain ownership: a strict tree, no back references
//! - Built once per build pass and then only read

use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use crate::error::{LookupError, RouteError};
use crate::routing::params::Params;
use crate::routing::segment::{classify, routable_segments, word_chars, Segment};

const SLUG_KEY: &str = "[]";
const CATCH_ALL_KEY: &str = "[...]";
const OPTIONAL_CATCH_ALL_KEY: &str = "[[...]]";

fn is_marker(key: &str) -> bool {
    key == SLUG_KEY || key == CATCH_ALL_KEY || key == OPTIONAL_CATCH_ALL_KEY
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<T> {
    pub target: T,
    pub params: Params,
}

/// One path segment level.
#[derive(Debug)]
struct Node<T> {
    children: HashMap<String, Node<T>>,
    slug_name: Option<String>,
    rest_slug_name: Option<String>,
    optional_rest_slug_name: Option<String>,
    target: Option<T>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            slug_name: None,
            rest_slug_name: None,
            optional_rest_slug_name: None,
            target: None,
        }
    }

    /// True until a route is attached directly at this node.
    fn is_placeholder(&self) -> bool {
        self.target.is_none()
    }

    fn count(&self) -> usize {
        usize::from(!self.is_placeholder()) + self.children.values().map(Node::count).sum::<usize>()
    }

    fn collect<'a>(&'a self, pattern: &str, out: &mut Vec<(String, &'a T)>) {
        if let Some(target) = &self.target {
            let pattern = if pattern.is_empty() { "/" } else { pattern };
            out.push((pattern.to_string(), target));
        }

        let mut literals: Vec<_> = self
            .children
            .iter()
            .filter(|(key, _)| !is_marker(key))
            .collect();
        literals.sort_by(|a, b| a.0.cmp(b.0));
        for (key, child) in literals {
            child.collect(&format!("{pattern}/{key}"), out);
        }

        let dynamic = [
            (SLUG_KEY, &self.slug_name, "[", "]"),
            (CATCH_ALL_KEY, &self.rest_slug_name, "[...", "]"),
            (OPTIONAL_CATCH_ALL_KEY, &self.optional_rest_slug_name, "[[...", "]]"),
        ];
        for (key, name, open, close) in dynamic {
            if let (Some(child), Some(name)) = (self.children.get(key), name) {
                child.collect(&format!("{pattern}/{open}{name}{close}"), out);
            }
        }
    }
}

/// A trie of routes keyed by path segment.
#[derive(Debug)]
pub struct RouteTrie<T> {
    root: Node<T>,
}

impl<T> Default for RouteTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTrie<T> {
    pub fn new() -> Self {
        Self { root: Node::new() }
    }

    /// Number of routes in the trie.
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All routes as canonical patterns, in matching priority order.
    pub fn routes(&self) -> Vec<(String, &T)> {
        let mut out = Vec::new();
        self.root.collect("", &mut out);
        out
    }
}

impl<T: fmt::Display> RouteTrie<T> {
    /// Insert a route.
    ///
    /// `path` uses the file-system syntax (`/users/[id]`, `/(group)/docs/[[...slug]]`).
    /// Any layout violation aborts with an error; the trie must then be discarded.
    pub fn insert(&mut self, path: &str, target: T) -> Result<(), RouteError> {
        let mut slug_names: Vec<&str> = Vec::new();
        let mut pattern = String::new();
        let mut catch_all_seen = false;
        let mut node = &mut self.root;

        for raw in routable_segments(path) {
            if catch_all_seen {
                return Err(RouteError::CatchAllNotLast {
                    path: path.to_string(),
                });
            }

            let segment = classify(raw)?;
            let key = match segment {
                Segment::Literal(text) => text,
                Segment::Slug(name) => {
                    register_slug(node.slug_name.as_deref(), name, &mut slug_names)?;
                    node.slug_name = Some(name.to_string());
                    SLUG_KEY
                }
                Segment::CatchAll(name) => {
                    if let Some(existing) = &node.optional_rest_slug_name {
                        return Err(RouteError::OptionalAndRequiredCatchAll {
                            existing: existing.clone(),
                            segment: raw.to_string(),
                        });
                    }
                    register_slug(node.rest_slug_name.as_deref(), name, &mut slug_names)?;
                    node.rest_slug_name = Some(name.to_string());
                    CATCH_ALL_KEY
                }
                Segment::OptionalCatchAll(name) => {
                    if let Some(existing) = &node.rest_slug_name {
                        return Err(RouteError::RequiredAndOptionalCatchAll {
                            existing: existing.clone(),
                            segment: raw.to_string(),
                        });
                    }
                    if !node.is_placeholder() {
                        return Err(RouteError::OptionalCatchAllSpecificity {
                            pattern: display_pattern(&pattern),
                            slug: name.to_string(),
                        });
                    }
                    register_slug(
                        node.optional_rest_slug_name.as_deref(),
                        name,
                        &mut slug_names,
                    )?;
                    node.optional_rest_slug_name = Some(name.to_string());
                    OPTIONAL_CATCH_ALL_KEY
                }
            };

            catch_all_seen = segment.is_catch_all();
            pattern.push('/');
            pattern.push_str(raw);
            node = node.children.entry(key.to_string()).or_insert_with(Node::new);
        }

        if let Some(existing) = &node.target {
            return Err(RouteError::DuplicateRoute {
                pattern: display_pattern(&pattern),
                existing: existing.to_string(),
                incoming: target.to_string(),
            });
        }
        if let Some(slug) = &node.optional_rest_slug_name {
            return Err(RouteError::OptionalCatchAllSpecificity {
                pattern: display_pattern(&pattern),
                slug: slug.clone(),
            });
        }

        node.target = Some(target);
        Ok(())
    }
}

impl<T: Clone + Send + Sync> RouteTrie<T> {
    /// Find the most specific route for `path` whose target passes `is_valid`.
    ///
    /// Returns `Ok(None)` for ordinary misses. An error means the table holds a
    /// layout that insertion should have rejected.
    pub async fn lookup<F, Fut>(
        &self,
        path: &str,
        is_valid: F,
    ) -> Result<Option<RouteMatch<T>>, LookupError>
    where
        F: Fn(&T) -> Fut + Sync,
        Fut: Future<Output = bool> + Send,
    {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        lookup_node(&self.root, &segments, Params::new(), &is_valid, "").await
    }
}

fn display_pattern(pattern: &str) -> String {
    if pattern.is_empty() {
        "/".to_string()
    } else {
        pattern.to_string()
    }
}

fn register_slug<'a>(
    previous: Option<&str>,
    next: &'a str,
    slug_names: &mut Vec<&'a str>,
) -> Result<(), RouteError> {
    if let Some(previous) = previous {
        if previous != next {
            return Err(RouteError::SlugNameMismatch {
                previous: previous.to_string(),
                next: next.to_string(),
            });
        }
    }

    for existing in slug_names.iter() {
        if *existing == next {
            return Err(RouteError::RepeatedSlug {
                name: next.to_string(),
            });
        }
        if word_chars(existing) == word_chars(next) {
            return Err(RouteError::SlugsDifferBySymbols {
                first: existing.to_string(),
                second: next.to_string(),
            });
        }
    }

    slug_names.push(next);
    Ok(())
}

fn lookup_node<'a, T, F, Fut>(
    node: &'a Node<T>,
    segments: &'a [&'a str],
    params: Params,
    is_valid: &'a F,
    walked: &'a str,
) -> BoxFuture<'a, Result<Option<RouteMatch<T>>, LookupError>>
where
    T: Clone + Send + Sync,
    F: Fn(&T) -> Fut + Sync,
    Fut: Future<Output = bool> + Send + 'a,
{
    async move {
        let Some((segment, rest)) = segments.split_first() else {
            if let Some(target) = &node.target {
                if is_valid(target).await {
                    if let Some(slug) = &node.optional_rest_slug_name {
                        return Err(LookupError::OptionalCatchAllSpecificity {
                            pattern: display_pattern(walked),
                            slug: slug.clone(),
                        });
                    }
                    return Ok(Some(RouteMatch {
                        target: target.clone(),
                        params,
                    }));
                }
            }
            return Ok(match_catch_all(
                node.children.get(OPTIONAL_CATCH_ALL_KEY),
                node.optional_rest_slug_name.as_deref(),
                &[],
                params,
                is_valid,
            )
            .await);
        };

        let walked_next = format!("{walked}/{segment}");

        if !is_marker(segment) {
            if let Some(child) = node.children.get(*segment) {
                let found = lookup_node(child, rest, params.clone(), is_valid, &walked_next).await?;
                if found.is_some() {
                    return Ok(found);
                }
            }
        }

        if let (Some(child), Some(name)) = (node.children.get(SLUG_KEY), node.slug_name.as_deref()) {
            let mut bound = params.clone();
            bound.bind_one(name, segment);
            let found = lookup_node(child, rest, bound, is_valid, &walked_next).await?;
            if found.is_some() {
                return Ok(found);
            }
        }

        let found = match_catch_all(
            node.children.get(CATCH_ALL_KEY),
            node.rest_slug_name.as_deref(),
            segments,
            params.clone(),
            is_valid,
        )
        .await;
        if found.is_some() {
            return Ok(found);
        }

        Ok(match_catch_all(
            node.children.get(OPTIONAL_CATCH_ALL_KEY),
            node.optional_rest_slug_name.as_deref(),
            segments,
            params,
            is_valid,
        )
        .await)
    }
    .boxed()
}

async fn match_catch_all<T, F, Fut>(
    child: Option<&Node<T>>,
    name: Option<&str>,
    segments: &[&str],
    mut params: Params,
    is_valid: &F,
) -> Option<RouteMatch<T>>
where
    T: Clone,
    F: Fn(&T) -> Fut,
    Fut: Future<Output = bool>,
{
    let target = child?.target.as_ref()?;
    let name = name?;
    if !is_valid(target).await {
        return None;
    }
    params.bind_many(name, segments);
    Some(RouteMatch {
        target: target.clone(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::params::ParamValue;
    use std::future::{ready, Ready};

    fn accept_all<T>(_: &T) -> Ready<bool> {
        ready(true)
    }

    fn trie(routes: &[&'static str]) -> RouteTrie<&'static str> {
        let mut trie = RouteTrie::new();
        for route in routes {
            trie.insert(route, *route).unwrap();
        }
        trie
    }

    async fn target_of(trie: &RouteTrie<&'static str>, path: &str) -> Option<&'static str> {
        trie.lookup(path, accept_all)
            .await
            .unwrap()
            .map(|m| m.target)
    }

    #[tokio::test]
    async fn test_literal_routes_match_exactly() {
        let trie = trie(&["/", "/about", "/blog/posts"]);

        let found = trie.lookup("/blog/posts", accept_all).await.unwrap().unwrap();
        assert_eq!(found.target, "/blog/posts");
        assert!(found.params.is_empty());

        assert_eq!(target_of(&trie, "/").await, Some("/"));
        assert_eq!(target_of(&trie, "/about/").await, Some("/about"));
        assert_eq!(target_of(&trie, "/blog").await, None);
        assert_eq!(target_of(&trie, "/missing").await, None);
    }

    #[tokio::test]
    async fn test_dynamic_slug() {
        let trie = trie(&["/posts/[id]"]);

        let found = trie.lookup("/posts/42", accept_all).await.unwrap().unwrap();
        assert_eq!(found.params.get("id"), Some("42"));

        assert_eq!(target_of(&trie, "/posts").await, None);
        assert_eq!(target_of(&trie, "/posts/42/extra").await, None);
    }

    #[tokio::test]
    async fn test_deeper_route_under_slug() {
        let trie = trie(&["/posts/[id]", "/posts/[id]/comments"]);

        let found = trie
            .lookup("/posts/42/comments", accept_all)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.target, "/posts/[id]/comments");
        assert_eq!(found.params.get("id"), Some("42"));
    }

    #[tokio::test]
    async fn test_required_catch_all() {
        let trie = trie(&["/files/[...path]"]);

        let found = trie.lookup("/files/a/b/c", accept_all).await.unwrap().unwrap();
        assert_eq!(
            found.params.value("path"),
            Some(&ParamValue::Many(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(target_of(&trie, "/files").await, None);
    }

    #[tokio::test]
    async fn test_optional_catch_all() {
        let trie = trie(&["/files/[[...path]]"]);

        let found = trie.lookup("/files", accept_all).await.unwrap().unwrap();
        assert_eq!(found.params.get_all("path"), Some(&[][..]));

        let found = trie.lookup("/files/a/b", accept_all).await.unwrap().unwrap();
        assert_eq!(found.params.get_all("path").unwrap(), &["a", "b"]);
    }

    #[tokio::test]
    async fn test_literal_beats_dynamic_beats_catch_all() {
        let trie = trie(&["/posts/archive", "/posts/[id]", "/posts/[...rest]"]);

        assert_eq!(target_of(&trie, "/posts/archive").await, Some("/posts/archive"));
        assert_eq!(target_of(&trie, "/posts/7").await, Some("/posts/[id]"));
        assert_eq!(target_of(&trie, "/posts/7/8").await, Some("/posts/[...rest]"));
    }

    #[tokio::test]
    async fn test_falls_back_when_literal_branch_dead_ends() {
        let trie = trie(&["/a/b/c", "/a/[x]/d"]);

        let found = trie.lookup("/a/b/d", accept_all).await.unwrap().unwrap();
        assert_eq!(found.target, "/a/[x]/d");
        assert_eq!(found.params.get("x"), Some("b"));
    }

    #[tokio::test]
    async fn test_predicate_rejection_tries_next_branch() {
        let trie = trie(&["/posts/archive", "/posts/[id]", "/posts/[...rest]"]);

        let skip_literal = |target: &&'static str| ready(*target != "/posts/archive");
        let found = trie.lookup("/posts/archive", skip_literal).await.unwrap().unwrap();
        assert_eq!(found.target, "/posts/[id]");

        let only_catch_all = |target: &&'static str| ready(*target == "/posts/[...rest]");
        let found = trie.lookup("/posts/archive", only_catch_all).await.unwrap().unwrap();
        assert_eq!(found.params.get_all("rest").unwrap(), &["archive"]);

        let reject_all = |_: &&'static str| ready(false);
        assert!(trie.lookup("/posts/archive", reject_all).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_groups_are_invisible() {
        let trie = trie(&["/(marketing)/pricing"]);
        assert_eq!(target_of(&trie, "/pricing").await, Some("/(marketing)/pricing"));

        let mut trie = trie;
        let err = trie.insert("/pricing", "/pricing").unwrap_err();
        assert_eq!(
            err,
            RouteError::DuplicateRoute {
                pattern: "/pricing".into(),
                existing: "/(marketing)/pricing".into(),
                incoming: "/pricing".into(),
            }
        );
    }

    #[test]
    fn test_insert_conflicts() {
        let mut trie: RouteTrie<&str> = RouteTrie::new();
        trie.insert("/posts/[id]", "a").unwrap();

        assert!(matches!(
            trie.insert("/posts/[slug]", "b"),
            Err(RouteError::SlugNameMismatch { .. })
        ));
        assert!(matches!(
            trie.insert("/y/[id]/[id]", "c"),
            Err(RouteError::RepeatedSlug { .. })
        ));
        assert!(matches!(
            trie.insert("/x/[post-id]/[postid]", "d"),
            Err(RouteError::SlugsDifferBySymbols { .. })
        ));
        assert!(matches!(
            trie.insert("/docs/[...slug]/edit", "e"),
            Err(RouteError::CatchAllNotLast { .. })
        ));
    }

    #[test]
    fn test_catch_all_kinds_cannot_share_a_level() {
        let mut trie: RouteTrie<&str> = RouteTrie::new();
        trie.insert("/docs/[...slug]", "a").unwrap();
        assert!(matches!(
            trie.insert("/docs/[[...slug]]", "b"),
            Err(RouteError::RequiredAndOptionalCatchAll { .. })
        ));

        let mut trie: RouteTrie<&str> = RouteTrie::new();
        trie.insert("/docs/[[...slug]]", "a").unwrap();
        assert!(matches!(
            trie.insert("/docs/[...slug]", "b"),
            Err(RouteError::OptionalAndRequiredCatchAll { .. })
        ));
    }

    #[test]
    fn test_optional_catch_all_specificity_rejected_in_both_orders() {
        let mut trie: RouteTrie<&str> = RouteTrie::new();
        trie.insert("/docs", "docs").unwrap();
        assert!(matches!(
            trie.insert("/docs/[[...slug]]", "slug"),
            Err(RouteError::OptionalCatchAllSpecificity { .. })
        ));

        let mut trie: RouteTrie<&str> = RouteTrie::new();
        trie.insert("/[[...slug]]", "slug").unwrap();
        assert!(matches!(
            trie.insert("/", "index"),
            Err(RouteError::OptionalCatchAllSpecificity { .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_reports_specificity_defect() {
        let mut trie = trie(&["/docs/[[...slug]]"]);
        // Bypass insert validation to simulate a corrupted table
        if let Some(docs) = trie.root.children.get_mut("docs") {
            docs.target = Some("/docs");
        }

        let err = trie.lookup("/docs", accept_all).await.unwrap_err();
        assert_eq!(
            err,
            LookupError::OptionalCatchAllSpecificity {
                pattern: "/docs".into(),
                slug: "slug".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_marker_text_is_not_a_literal() {
        let trie = trie(&["/posts/[id]/edit"]);
        let found = trie.lookup("/posts/[]/edit", accept_all).await.unwrap().unwrap();
        assert_eq!(found.params.get("id"), Some("[]"));
    }

    #[test]
    fn test_routes_listing_order() {
        let trie = trie(&[
            "/",
            "/users/[id]",
            "/users/me",
            "/files/[...path]",
            "/docs/[[...slug]]",
        ]);

        let patterns: Vec<_> = trie.routes().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            patterns,
            vec![
                "/",
                "/docs/[[...slug]]",
                "/files/[...path]",
                "/users/me",
                "/users/[id]",
            ]
        );
        assert_eq!(trie.len(), 5);
    }
}
