//! Route pattern segmentation and segment keys
//!
//! A route pattern such as `/wp/v2/posts/(?P<id>[\d]+)` is split on `/`,
//! except inside a parenthesized group, so regex parameters survive as
//! single segments. Each segment is identified in the policy tree by a
//! content hash of its text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::LazyLock;

/// A group runs from `(` to the first following `)`; only bare `/` matches split.
static SPLIT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|/").expect("split token regex is valid"));

static NAMED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\w+>").expect("named group regex is valid"));

/// Split a route pattern into its segments.
///
/// A single leading `/` is stripped and empty pieces are dropped.
pub fn split_route(route: &str) -> Vec<String> {
    let route = route.strip_prefix('/').unwrap_or(route);

    let mut segments = Vec::new();
    let mut start = 0;
    for token in SPLIT_TOKEN.find_iter(route) {
        if token.as_str() == "/" {
            push_segment(&mut segments, &route[start..token.start()]);
            start = token.end();
        }
    }
    push_segment(&mut segments, &route[start..]);

    segments
}

fn push_segment(segments: &mut Vec<String>, piece: &str) {
    if !piece.is_empty() {
        segments.push(piece.to_string());
    }
}

/// Whether a segment carries a named regex parameter such as `(?P<id>\d+)`.
pub fn is_parameter(segment: &str) -> bool {
    NAMED_GROUP.is_match(segment)
}

/// Stable identifier of a segment inside the policy tree.
///
/// Lowercase hex SHA-256 of the segment text. Two segments whose digests
/// collide would share a node; at route-table scale this is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentKey(String);

impl SegmentKey {
    /// Derive the key of a segment.
    pub fn of(segment: &str) -> Self {
        Self(hex::encode(Sha256::digest(segment.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SegmentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for SegmentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key for a segment's text.
pub fn segment_key(segment: &str) -> SegmentKey {
    SegmentKey::of(segment)
}
