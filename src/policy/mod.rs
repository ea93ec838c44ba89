//! Route policy module
//!
//! Per-route enable/public policy, stored as a tree that mirrors the API's
//! route namespace.
//!
//! ## Policy Model
//!
//! ```text
//! wp ─┬─ v2 ─┬─ posts ── (?P<id>[\d]+)
//!     │      └─ users
//! oembed ── 1.0 ── embed
//! ```
//!
//! - Every segment of every registered route is a node, keyed by a hash of
//!   its text
//! - New nodes are disabled and private
//! - A request is admitted by the flags of its route's last segment only;
//!   the other segments merely have to be present
//! - Disabled or unknown routes answer "not found", enabled private routes
//!   answer "unauthorized" to anonymous callers
//!
//! The tree is rebuilt from the saved settings and the live route set on
//! every read ([`build_tree`]); a settings submission is folded into a tree
//! by [`merge_overrides`]; requests are decided by [`RouteTable::evaluate`].

pub mod builder;
pub mod matcher;
pub mod merger;
pub mod segments;
pub mod tree;

pub use builder::build_tree;
pub use matcher::{RouteTable, Verdict};
pub use merger::{Flag, Override, OverrideTree, merge_overrides};
pub use segments::{SegmentKey, is_parameter, segment_key, split_route};
pub use tree::{Branches, ListingEntry, PolicyNode, PolicyTree};
