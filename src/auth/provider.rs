//! Authentication capability
//!
//! The gate only needs to know whether the caller is authenticated. How
//! that is established is up to the host; implementations inspect the
//! request headers.

use axum::http::HeaderMap;
use std::sync::Arc;

/// Answers "is this caller authenticated" for a request
pub trait Authenticator: Send + Sync {
    /// Whether the request carrying `headers` comes from an authenticated caller.
    fn is_authenticated(&self, headers: &HeaderMap) -> bool;

    /// Get a description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Shared authenticator handle
pub type SharedAuthenticator = Arc<dyn Authenticator>;

/// Treats every caller as anonymous, so only public routes are reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authenticator for Anonymous {
    fn is_authenticated(&self, _headers: &HeaderMap) -> bool {
        false
    }

    fn auth_type(&self) -> &'static str {
        "anonymous"
    }
}

/// Extract the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_anonymous() {
        assert!(!Anonymous.is_authenticated(&HeaderMap::new()));
        assert_eq!(Anonymous.auth_type(), "anonymous");
    }
}
