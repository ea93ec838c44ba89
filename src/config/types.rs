//! Configuration types for routeguard
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::util::SecretString;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Policy persistence
    pub store: StoreConfig,

    /// Caller and operator credentials
    pub auth: AuthConfig,

    /// Registered routes, in matching order
    pub routes: Vec<RouteConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Preferred port (the next free one is used if taken)
    pub port: u16,

    /// Server name reported on the index route
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 20380,
            name: "routeguard".to_string(),
        }
    }
}

/// Policy store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend
    pub backend: StoreBackend,

    /// Directory for the file backend
    pub path: Option<String>,

    /// Key the policy tree is saved under
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: None,
            key: "routeguard".to_string(),
        }
    }
}

/// Policy store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process, lost on restart
    #[default]
    Memory,
    /// JSON files in `store.path`
    File,
}

/// Credentials configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer tokens that count as authenticated callers
    pub tokens: Vec<SecretString>,

    /// Bearer token for the admin API (admin API is off when unset)
    pub admin_token: Option<SecretString>,
}

/// A registered route
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Path pattern; regex groups such as `(?P<id>\d+)` are allowed
    pub pattern: String,

    /// Accepted methods (informational)
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
