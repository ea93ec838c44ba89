//! Error types for routeguard
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API.
//! None of these cross the request gate: the gate converts every failure
//! into one of its three verdicts.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy store error: {0}")]
    Store(#[from] StoreError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Policy store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Policy store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored policy under '{key}' is malformed: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while preparing the policy core
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Route pattern '{pattern}' does not compile: {reason}")]
    PatternCompile { pattern: String, reason: String },
}

impl PolicyError {
    pub fn pattern_compile(pattern: impl Into<String>, reason: impl ToString) -> Self {
        PolicyError::PatternCompile {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for policy store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_compile_message() {
        let err = PolicyError::pattern_compile("/a/(?P<id", "unclosed group");
        let msg = err.to_string();
        assert!(msg.contains("/a/(?P<id"));
        assert!(msg.contains("unclosed group"));
    }

    #[test]
    fn test_store_error_into_app_error() {
        let err: AppError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, AppError::Store(StoreError::Unavailable(_))));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_corrupt_names_key() {
        let err = StoreError::Corrupt {
            key: "routeguard".into(),
            reason: "expected a map".into(),
        };
        assert!(err.to_string().contains("'routeguard'"));
    }
}
