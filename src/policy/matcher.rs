//! Request admission
//!
//! Resolves a concrete request path to the first registered route pattern
//! that matches it, then walks the policy tree along that pattern's
//! segments. Every outcome is one of three verdicts; structural gaps and
//! disabled routes both read as [`Verdict::NotFound`] so that blocked
//! routes are indistinguishable from absent ones.

use crate::error::PolicyError;
use crate::policy::segments::{SegmentKey, split_route};
use crate::policy::tree::PolicyTree;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace, warn};

/// Admission outcome for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Dispatch to the handler
    Allow,
    /// No admissible route (unknown, unsaved or disabled)
    NotFound,
    /// Route requires an authenticated caller
    Unauthorized,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::NotFound => "not_found",
            Verdict::Unauthorized => "unauthorized",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered route pattern, compiled for whole-path matching
#[derive(Debug)]
struct CompiledRoute {
    source: String,
    regex: Regex,
    keys: Vec<SegmentKey>,
}

impl CompiledRoute {
    fn compile(pattern: &str) -> Result<Self, PolicyError> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
            .map_err(|e| PolicyError::pattern_compile(pattern, e))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            keys: split_route(pattern)
                .iter()
                .map(|segment| SegmentKey::of(segment))
                .collect(),
        })
    }
}

/// Registered route patterns in registration order
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile `patterns`, skipping any that are not valid expressions.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let routes = patterns
            .into_iter()
            .filter_map(|pattern| match CompiledRoute::compile(pattern.as_ref()) {
                Ok(route) => Some(route),
                Err(e) => {
                    warn!(error = %e, "Skipping route pattern");
                    None
                }
            })
            .collect();

        Self { routes }
    }

    /// Create an empty table (matches nothing)
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Get the number of compiled patterns
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// First pattern that matches the whole of `path`.
    pub fn find_match(&self, path: &str) -> Option<&str> {
        self.find(path).map(|route| route.source.as_str())
    }

    fn find(&self, path: &str) -> Option<&CompiledRoute> {
        self.routes.iter().find(|route| route.regex.is_match(path))
    }

    /// Decide admission for a request.
    ///
    /// `is_authenticated` is consulted only for enabled, non-public routes.
    pub fn evaluate<F>(
        &self,
        method: &str,
        path: &str,
        tree: &PolicyTree,
        is_authenticated: F,
    ) -> Verdict
    where
        F: FnOnce() -> bool,
    {
        self.evaluate_match(method, path, tree, is_authenticated).0
    }

    /// Like [`RouteTable::evaluate`], also returning the pattern `path`
    /// resolved to, if any.
    pub fn evaluate_match<F>(
        &self,
        method: &str,
        path: &str,
        tree: &PolicyTree,
        is_authenticated: F,
    ) -> (Verdict, Option<&str>)
    where
        F: FnOnce() -> bool,
    {
        if path == "/" {
            debug!(method, path, verdict = %Verdict::Allow, "Route gate decision");
            return (Verdict::Allow, None);
        }

        let route = self.find(path);
        let verdict = match route {
            Some(route) => {
                trace!(pattern = %route.source, "Matched route pattern");
                route.resolve(tree, is_authenticated)
            }
            None => {
                trace!("No registered pattern matches");
                Verdict::NotFound
            }
        };
        debug!(method, path, verdict = %verdict, "Route gate decision");
        (verdict, route.map(|route| route.source.as_str()))
    }
}

impl CompiledRoute {
    /// Walk `tree` along this pattern's segments and read the leaf flags.
    fn resolve<F>(&self, tree: &PolicyTree, is_authenticated: F) -> Verdict
    where
        F: FnOnce() -> bool,
    {
        let Some((leaf, prefix)) = self.keys.split_last() else {
            return Verdict::NotFound;
        };

        let mut branches = &tree.roots;
        for key in prefix {
            match branches.get(key) {
                Some(node) => branches = &node.branches,
                None => {
                    trace!(key = %key, "Pattern segment missing from policy");
                    return Verdict::NotFound;
                }
            }
        }

        match branches.get(leaf) {
            Some(node) if node.enabled => {
                if node.public || is_authenticated() {
                    Verdict::Allow
                } else {
                    Verdict::Unauthorized
                }
            }
            _ => Verdict::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::builder::build_tree;
    use crate::policy::segments::segment_key;
    use rstest::rstest;

    fn enable(tree: &mut PolicyTree, segments: &[&str], public: bool) {
        let path: Vec<_> = segments.iter().map(|s| segment_key(s)).collect();
        let node = tree.node_mut(&path).unwrap();
        node.enabled = true;
        node.public = public;
    }

    #[rstest]
    #[case("/wp/v2/posts", Some("/wp/v2/posts"))]
    #[case("/WP/V2/Posts", Some("/wp/v2/posts"))]
    #[case("/wp/v2/posts/42", Some("/wp/v2/posts/(?P<id>[\\d]+)"))]
    #[case("/wp/v2/posts/abc", None)]
    #[case("/wp/v2/posts/42/extra", None)]
    #[case("/x/wp/v2/posts", None)]
    fn test_find_match_is_anchored(#[case] path: &str, #[case] expected: Option<&str>) {
        let table = RouteTable::new(["/wp/v2/posts", "/wp/v2/posts/(?P<id>[\\d]+)"]);
        assert_eq!(table.find_match(path), expected);
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let table = RouteTable::new(["/a|/b"]);
        assert_eq!(table.find_match("/a"), Some("/a|/b"));
        assert_eq!(table.find_match("/a/zzz"), None);
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let table = RouteTable::new(["/bad/(?P<id", "/good"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_match("/good"), Some("/good"));
    }

    #[test]
    fn test_root_always_allowed() {
        let table = RouteTable::empty();
        let verdict = table.evaluate("GET", "/", &PolicyTree::new(), || false);
        assert_eq!(verdict, Verdict::Allow);
    }

    #[test]
    fn test_intermediate_flags_do_not_gate() {
        let routes = ["/a/b"];
        let mut tree = build_tree(routes, PolicyTree::new());
        enable(&mut tree, &["a", "b"], true);

        let table = RouteTable::new(routes);
        assert_eq!(table.evaluate("GET", "/a/b", &tree, || false), Verdict::Allow);
    }

    #[test]
    fn test_unsaved_route_fails_closed() {
        let table = RouteTable::new(["/a/b"]);
        let tree = build_tree(["/a"], PolicyTree::new());
        assert_eq!(table.evaluate("GET", "/a/b", &tree, || true), Verdict::NotFound);
    }

    #[test]
    fn test_only_first_match_evaluated() {
        let routes = ["/a/(?P<x>.+)", "/a/b"];
        let mut tree = build_tree(routes, PolicyTree::new());
        enable(&mut tree, &["a", "b"], true);

        let table = RouteTable::new(routes);
        assert_eq!(table.evaluate("GET", "/a/b", &tree, || true), Verdict::NotFound);
    }

    #[test]
    fn test_auth_not_consulted_for_public_routes() {
        let routes = ["/a"];
        let mut tree = build_tree(routes, PolicyTree::new());
        enable(&mut tree, &["a"], true);

        let table = RouteTable::new(routes);
        let verdict = table.evaluate("GET", "/a", &tree, || panic!("auth consulted"));
        assert_eq!(verdict, Verdict::Allow);
    }

    #[test]
    fn test_evaluate_match_reports_pattern_once() {
        let routes = ["/a/(?P<id>\\d+)", "/a/b"];
        let mut tree = build_tree(routes, PolicyTree::new());
        enable(&mut tree, &["a", "b"], false);
        let table = RouteTable::new(routes);

        assert_eq!(
            table.evaluate_match("GET", "/a/b", &tree, || true),
            (Verdict::Allow, Some("/a/b"))
        );
        assert_eq!(
            table.evaluate_match("GET", "/a/b", &tree, || false),
            (Verdict::Unauthorized, Some("/a/b"))
        );
        assert_eq!(
            table.evaluate_match("GET", "/a/7", &tree, || true),
            (Verdict::NotFound, Some("/a/(?P<id>\\d+)"))
        );
        assert_eq!(
            table.evaluate_match("GET", "/z", &tree, || true),
            (Verdict::NotFound, None)
        );
        assert_eq!(
            table.evaluate_match("GET", "/", &tree, || false),
            (Verdict::Allow, None)
        );
    }

    #[test]
    fn test_segmentless_pattern_is_not_found() {
        let table = RouteTable::new(["/", "//"]);
        assert_eq!(
            table.evaluate("GET", "//", &PolicyTree::new(), || true),
            Verdict::NotFound
        );
    }
}
