//! Bearer token authentication
//!
//! A caller is authenticated when it presents one of the configured tokens.

use crate::auth::provider::{Authenticator, bearer_token};
use crate::util::SecretString;
use axum::http::HeaderMap;

/// Accepts `Authorization: Bearer <token>` for a fixed token set
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    tokens: Vec<SecretString>,
}

impl TokenAuthenticator {
    /// Create an authenticator; empty tokens are ignored
    pub fn new(tokens: impl IntoIterator<Item = SecretString>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .filter(|t| !t.expose_secret().is_empty())
                .collect(),
        }
    }

    /// Number of accepted tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `candidate` is one of the accepted tokens
    pub fn accepts(&self, candidate: &str) -> bool {
        self.tokens.iter().any(|t| t.expose_secret() == candidate)
    }
}

impl Authenticator for TokenAuthenticator {
    fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        bearer_token(headers).is_some_and(|token| self.accepts(token))
    }

    fn auth_type(&self) -> &'static str {
        "bearer_token"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_accepts_configured_token() {
        let auth = TokenAuthenticator::new([SecretString::new("t1"), SecretString::new("t2")]);
        assert!(auth.is_authenticated(&headers_with("Bearer t2")));
        assert!(!auth.is_authenticated(&headers_with("Bearer t3")));
        assert!(!auth.is_authenticated(&HeaderMap::new()));
    }

    #[test]
    fn test_empty_tokens_ignored() {
        let auth = TokenAuthenticator::new([SecretString::new("")]);
        assert!(auth.is_empty());
        assert!(!auth.accepts(""));
    }
}
