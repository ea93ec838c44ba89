//! Tree construction from the live route set
//!
//! The saved tree is the starting point: its flags are kept and only the
//! structure missing for currently-registered routes is added. Nodes for
//! routes that are no longer registered are retained with their last-known
//! flags, so a route that disappears for one deploy keeps its settings.

use crate::policy::segments::{SegmentKey, split_route};
use crate::policy::tree::{Branches, PolicyNode, PolicyTree};
use tracing::trace;

/// Build the complete policy tree for `routes` on top of `saved`.
pub fn build_tree<I, S>(routes: I, saved: PolicyTree) -> PolicyTree
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tree = saved;
    for route in routes {
        let segments = split_route(route.as_ref());
        graft(&mut tree.roots, &segments);
    }
    tree
}

/// Ensure the path for `segments` exists below `branches`.
fn graft(branches: &mut Branches, segments: &[String]) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };

    let node = branches
        .entry(SegmentKey::of(segment))
        .and_modify(|node| node.name.clone_from(segment))
        .or_insert_with(|| {
            trace!(segment = %segment, "Adding closed policy node");
            PolicyNode::new(segment.as_str())
        });

    graft(&mut node.branches, rest);
}
