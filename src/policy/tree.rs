//! Policy tree types
//!
//! The tree mirrors the route namespace: one node per segment, keyed by
//! [`SegmentKey`], each carrying its own `enabled`/`public` flags.
//!
//! ## Persisted shape
//!
//! ```json
//! { "<key>": { "opts": { "name": "wp", "disabled": true, "public": false },
//!              "branches": { } } }
//! ```
//!
//! Missing `opts`, `branches` or individual flags take their closed
//! defaults. Flags are read leniently so that values written by form
//! handlers (`"1"`, `""`, `0`) are accepted.

use crate::policy::segments::{SegmentKey, is_parameter};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Child nodes keyed by segment hash.
pub type Branches = BTreeMap<SegmentKey, PolicyNode>;

/// One segment of the route namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredNode", into = "StoredNode")]
pub struct PolicyNode {
    /// Segment text, for display
    pub name: String,
    /// Route reachable through this node as a leaf
    pub enabled: bool,
    /// Enabled route admitted without authentication
    pub public: bool,
    pub branches: Branches,
}

impl PolicyNode {
    /// A closed node: disabled and private.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            public: false,
            branches: Branches::new(),
        }
    }
}

impl Default for PolicyNode {
    fn default() -> Self {
        Self::new("")
    }
}

/// The forest of top-level namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PolicyTree {
    pub roots: Branches,
}

impl<'de> Deserialize<'de> for PolicyTree {
    /// An empty saved policy may be a bare `[]`.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        lenient_branches(deserializer).map(|roots| Self { roots })
    }
}

impl PolicyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Follow a key path from the forest root.
    pub fn node(&self, path: &[SegmentKey]) -> Option<&PolicyNode> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.roots.get(first)?, |node, key| node.branches.get(key))
    }

    /// Mutable variant of [`PolicyTree::node`].
    pub fn node_mut(&mut self, path: &[SegmentKey]) -> Option<&mut PolicyNode> {
        let (first, rest) = path.split_first()?;
        rest.iter().try_fold(self.roots.get_mut(first)?, |node, key| {
            node.branches.get_mut(key)
        })
    }

    /// Total number of nodes in the forest.
    pub fn len(&self) -> usize {
        fn count(branches: &Branches) -> usize {
            branches.values().map(|n| 1 + count(&n.branches)).sum()
        }
        count(&self.roots)
    }

    /// Nested display listing, used by the admin API and the CLI.
    pub fn listing(&self) -> Vec<ListingEntry> {
        fn walk(branches: &Branches) -> Vec<ListingEntry> {
            branches
                .iter()
                .map(|(key, node)| ListingEntry {
                    key: key.clone(),
                    name: node.name.clone(),
                    parameter: is_parameter(&node.name),
                    enabled: node.enabled,
                    public: node.public,
                    children: walk(&node.branches),
                })
                .collect()
        }
        walk(&self.roots)
    }
}

/// Display form of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub key: SegmentKey,
    pub name: String,
    /// Segment holds a named regex parameter
    pub parameter: bool,
    pub enabled: bool,
    pub public: bool,
    pub children: Vec<ListingEntry>,
}

/// Wire form of a node.
#[derive(Serialize, Deserialize, Default)]
struct StoredNode {
    #[serde(default)]
    opts: StoredOpts,
    #[serde(default, deserialize_with = "lenient_branches")]
    branches: Branches,
}

#[derive(Serialize, Deserialize)]
struct StoredOpts {
    #[serde(default)]
    name: String,
    #[serde(default = "closed", deserialize_with = "lenient_bool")]
    disabled: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    public: bool,
}

impl Default for StoredOpts {
    fn default() -> Self {
        Self {
            name: String::new(),
            disabled: true,
            public: false,
        }
    }
}

fn closed() -> bool {
    true
}

impl From<StoredNode> for PolicyNode {
    fn from(stored: StoredNode) -> Self {
        Self {
            name: stored.opts.name,
            enabled: !stored.opts.disabled,
            public: stored.opts.public,
            branches: stored.branches,
        }
    }
}

impl From<PolicyNode> for StoredNode {
    fn from(node: PolicyNode) -> Self {
        Self {
            opts: StoredOpts {
                name: node.name,
                disabled: !node.enabled,
                public: node.public,
            },
            branches: node.branches,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null(()),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseBool::deserialize(deserializer)? {
        LooseBool::Bool(b) => b,
        LooseBool::Int(i) => i != 0,
        LooseBool::Float(f) => f != 0.0,
        LooseBool::Text(s) => !matches!(s.as_str(), "" | "0" | "false" | "off"),
        LooseBool::Null(()) => false,
    })
}

/// Empty child maps are sometimes written as `[]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBranches {
    Map(Branches),
    List(Vec<IgnoredAny>),
}

fn lenient_branches<'de, D>(deserializer: D) -> Result<Branches, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseBranches::deserialize(deserializer)? {
        LooseBranches::Map(branches) => Ok(branches),
        LooseBranches::List(items) if items.is_empty() => Ok(Branches::new()),
        LooseBranches::List(items) => Err(de::Error::invalid_length(
            items.len(),
            &"an empty list",
        )),
    }
}
