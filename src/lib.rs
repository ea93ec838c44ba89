//! Route-level access control for REST APIs
//!
//! An operator enables individual API routes and marks enabled routes as
//! public or restricted to authenticated callers; every request is checked
//! against that policy before it reaches its handler.
//!
//! ## Features
//!
//! - **Policy tree** mirroring the route namespace, one node per path segment
//! - **Closed by default** - new routes are disabled and private until enabled
//! - **Regex route patterns** - parameters like `(?P<id>\d+)` are single segments
//! - **Fail closed** - unknown, unsaved or disabled routes answer 404, store
//!   outages block everything but `/`
//! - **axum middleware** plus an admin API for reading and saving settings
//!
//! ## Admission
//!
//! ```text
//! path ─→ first matching route pattern ─→ walk tree by segment key ─→ leaf flags
//!            none: 404                      gap: 404                   disabled: 404
//!                                                                      private + anonymous: 401
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [store]
//! backend = "file"
//! path = "/var/lib/routeguard"
//!
//! [auth]
//! admin_token = "change-me"
//!
//! [[routes]]
//! pattern = "/wp/v2/posts"
//!
//! [[routes]]
//! pattern = "/wp/v2/posts/(?P<id>[\\d]+)"
//! ```

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod policy;
pub mod registry;
pub mod server;
pub mod store;
pub mod util;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use policy::{PolicyTree, RouteTable, Verdict};
pub use server::{AppState, build_router};
