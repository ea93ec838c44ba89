//! Operator overrides
//!
//! A settings submission carries two sparse trees keyed by segment hash:
//! one naming the nodes whose "enabled" box is checked and one naming the
//! nodes whose "public" box is checked. A key being present is the whole
//! signal; its leaf value is not inspected.

use crate::policy::segments::SegmentKey;
use crate::policy::tree::{Branches, PolicyNode, PolicyTree};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Sparse tree of touched nodes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct OverrideTree(pub BTreeMap<SegmentKey, Override>);

/// A touched node, possibly with touched descendants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Override {
    Nested(OverrideTree),
    Checked(serde_json::Value),
}

impl OverrideTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mark a key path as checked.
    pub fn check(&mut self, path: &[SegmentKey]) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        let entry = self
            .0
            .entry(first.clone())
            .or_insert_with(|| Override::Checked(serde_json::Value::Bool(true)));
        if rest.is_empty() {
            return;
        }
        if matches!(entry, Override::Checked(_)) {
            *entry = Override::Nested(OverrideTree::new());
        }
        if let Override::Nested(children) = entry {
            children.check(rest);
        }
    }

    /// Collect the tree for one bracketed form field.
    ///
    /// `enabled[k1][k2]=on` checks the path `k1/k2` of the `enabled` field.
    /// Pairs for other fields, and malformed names, are ignored.
    pub fn from_form_pairs<'a, I>(field: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut tree = Self::new();
        for (name, _value) in pairs {
            if let Some(path) = bracket_path(field, name) {
                tree.check(&path);
            }
        }
        tree
    }
}

/// Parse `field[a][b]` into `[a, b]`.
fn bracket_path(field: &str, name: &str) -> Option<Vec<SegmentKey>> {
    let mut rest = name.strip_prefix(field)?;
    let mut path = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let key = &inner[..close];
        if key.is_empty() {
            return None;
        }
        path.push(SegmentKey::from(key));
        rest = &inner[close + 1..];
    }
    (!path.is_empty()).then_some(path)
}

/// Flag an override tree sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Enabled,
    Public,
}

impl Flag {
    fn set(self, node: &mut PolicyNode) {
        match self {
            Flag::Enabled => node.enabled = true,
            Flag::Public => node.public = true,
        }
    }
}

/// Apply both override trees to `base`.
pub fn merge_overrides(
    base: PolicyTree,
    enabled: &OverrideTree,
    public: &OverrideTree,
) -> PolicyTree {
    let mut tree = base;
    apply(&mut tree.roots, enabled, Flag::Enabled);
    apply(&mut tree.roots, public, Flag::Public);
    tree
}

/// Set `flag` on every node named in `overrides`.
///
/// Nodes the base does not have yet are created closed before the flag is
/// set; the builder fills in their names on the next read.
pub fn apply(branches: &mut Branches, overrides: &OverrideTree, flag: Flag) {
    for (key, value) in &overrides.0 {
        let node = branches.entry(key.clone()).or_default();
        flag.set(node);
        if let Override::Nested(children) = value {
            apply(&mut node.branches, children, flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::builder::build_tree;
    use crate::policy::segments::segment_key;
    use serde_json::json;

    fn keys(segments: &[&str]) -> Vec<SegmentKey> {
        segments.iter().map(|s| segment_key(s)).collect()
    }

    #[test]
    fn test_sets_flags_along_path() {
        let base = build_tree(["/a/b", "/a/c"], PolicyTree::new());
        let mut enabled = OverrideTree::new();
        enabled.check(&keys(&["a", "b"]));

        let tree = merge_overrides(base, &enabled, &OverrideTree::new());
        assert!(tree.node(&keys(&["a"])).unwrap().enabled);
        assert!(tree.node(&keys(&["a", "b"])).unwrap().enabled);
        assert!(!tree.node(&keys(&["a", "c"])).unwrap().enabled);
        assert!(!tree.node(&keys(&["a", "b"])).unwrap().public);
    }

    #[test]
    fn test_unmentioned_nodes_keep_flags() {
        let mut base = build_tree(["/a/b", "/x"], PolicyTree::new());
        base.node_mut(&keys(&["x"])).unwrap().public = true;

        let mut public = OverrideTree::new();
        public.check(&keys(&["a", "b"]));
        let tree = merge_overrides(base, &OverrideTree::new(), &public);

        assert!(tree.node(&keys(&["x"])).unwrap().public);
        assert!(tree.node(&keys(&["a", "b"])).unwrap().public);
        assert!(!tree.node(&keys(&["a", "b"])).unwrap().enabled);
    }

    #[test]
    fn test_creates_missing_nodes_closed() {
        let mut public = OverrideTree::new();
        public.check(&keys(&["new"]));
        let tree = merge_overrides(PolicyTree::new(), &OverrideTree::new(), &public);

        let node = tree.node(&keys(&["new"])).unwrap();
        assert!(node.public);
        assert!(!node.enabled);
        assert!(node.name.is_empty());
    }

    #[test]
    fn test_deserializes_nested_json() {
        let a = segment_key("a").to_string();
        let b = segment_key("b").to_string();
        let overrides: OverrideTree = serde_json::from_value(json!({ (a.clone()): { (b): "on" } })).unwrap();

        let tree = merge_overrides(PolicyTree::new(), &overrides, &OverrideTree::new());
        assert!(tree.node(&keys(&["a", "b"])).unwrap().enabled);
        assert!(tree.node(&keys(&["a"])).unwrap().enabled);
        assert!(matches!(overrides.0[&SegmentKey::from(a)], Override::Nested(_)));
    }

    #[test]
    fn test_from_form_pairs() {
        let pairs = [
            ("enabled[k1]", "on"),
            ("enabled[k1][k2]", "on"),
            ("public[k1][k3]", "on"),
            ("enabled[]", "on"),
            ("enabled[k4", "on"),
            ("_wpnonce", "abc"),
        ];
        let enabled = OverrideTree::from_form_pairs("enabled", pairs);
        let public = OverrideTree::from_form_pairs("public", pairs);

        let tree = merge_overrides(PolicyTree::new(), &enabled, &public);
        let k1 = SegmentKey::from("k1");
        let k2 = SegmentKey::from("k2");
        let k3 = SegmentKey::from("k3");
        assert!(tree.node(&[k1.clone()]).unwrap().enabled);
        assert!(tree.node(&[k1.clone(), k2]).unwrap().enabled);
        assert!(tree.node(&[k1.clone(), k3.clone()]).unwrap().public);
        assert!(!tree.node(&[k1, k3]).unwrap().enabled);
        assert_eq!(tree.roots.len(), 1);
    }
}
