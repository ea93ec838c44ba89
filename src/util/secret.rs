//! Secret string type for token handling.
//!
//! API and admin tokens are read from configuration; this wrapper keeps
//! them out of `Debug` output, logs and error messages.

use serde::Deserialize;
use std::fmt;

/// A token that prints as `[REDACTED]`.
///
/// The value is only reachable through [`SecretString::expose_secret`], and
/// the buffer is cleared on drop (best-effort).
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicitly expose the secret value, e.g. to compare a presented token.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Not guaranteed: the value may have been copied elsewhere.
        self.0.clear();
        self.0.shrink_to_fit();
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    #[test]
    fn test_redacted_output() {
        let secret = SecretString::new("api-token-1");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "api-token-1");
    }

    #[test]
    fn test_auth_config_debug_hides_tokens() {
        let config: AuthConfig = serde_json::from_str(
            r#"{ "tokens": ["api-token-1"], "admin_token": "admin-token-1" }"#,
        )
        .unwrap();
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("api-token-1"));
        assert!(!debug_output.contains("admin-token-1"));
        assert_eq!(config.tokens[0].expose_secret(), "api-token-1");
    }
}
