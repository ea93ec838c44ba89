//! Authentication module
//!
//! Supplies the "is this caller authenticated" capability the gate needs
//! for enabled, non-public routes. Currently supports static bearer tokens.

pub mod provider;
pub mod token;

pub use provider::{Anonymous, Authenticator, SharedAuthenticator, bearer_token};
pub use token::TokenAuthenticator;

use crate::config::AuthConfig;
use std::sync::Arc;
use tracing::warn;

/// Create an authenticator from configuration
pub fn create_authenticator(config: &AuthConfig) -> SharedAuthenticator {
    let tokens = TokenAuthenticator::new(config.tokens.iter().cloned());
    if tokens.is_empty() {
        warn!("No API tokens configured, only public routes are reachable");
        Arc::new(Anonymous)
    } else {
        Arc::new(tokens)
    }
}
