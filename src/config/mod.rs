//! Configuration module
//!
//! Handles loading and validating configuration from TOML files and
//! environment variables: server binding, policy store, credentials and
//! the registered route set.

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::*;
