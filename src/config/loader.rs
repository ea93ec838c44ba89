//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (ROUTEGUARD__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::{AppConfig, StoreBackend};
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "routeguard.toml",
    ".routeguard.toml",
    "~/.config/routeguard/config.toml",
    "/etc/routeguard/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with ROUTEGUARD prefix
    // e.g., ROUTEGUARD__SERVER__PORT, ROUTEGUARD__STORE__PATH
    // Double underscore (__) maps to nested keys (server.port)
    // ROUTEGUARD__AUTH__TOKENS is a comma-separated list
    builder = builder.add_source(
        Environment::with_prefix("ROUTEGUARD")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("auth.tokens"),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
///
/// Route patterns that are not valid regular expressions are accepted here;
/// the matcher logs and skips them.
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.store.backend == StoreBackend::File && config.store.path.is_none() {
        return Err(ConfigError::Missing {
            field: "store.path (required for the file backend)".to_string(),
        });
    }

    validate_store_key(&config.store.key)?;
    validate_routes(config)?;

    Ok(())
}

/// Store keys become file names, so keep them to a safe alphabet
fn validate_store_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            message: format!(
                "store.key must be non-empty and use only [A-Za-z0-9._-], got: '{}'",
                key
            ),
        })
    }
}

fn validate_routes(config: &AppConfig) -> Result<(), ConfigError> {
    for (index, route) in config.routes.iter().enumerate() {
        if !route.pattern.starts_with('/') {
            return Err(ConfigError::InvalidPattern {
                pattern: route.pattern.clone(),
                reason: format!("in routes[{}]: pattern must start with '/'", index),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[server]
name = "test-server"
port = 9000

[store]
backend = "file"
path = "/var/lib/routeguard"

[[routes]]
pattern = "/wp/v2/posts"
methods = ["GET", "POST"]
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.name, "test-server");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path.as_deref(), Some("/var/lib/routeguard"));
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_file_backend_requires_path() {
        let toml = r#"
[store]
backend = "file"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_invalid_store_key() {
        for key in ["", "../escape", ".hidden", "a/b"] {
            assert!(validate_store_key(key).is_err(), "accepted '{}'", key);
        }
        assert!(validate_store_key("rest-api.policy_v1").is_ok());
    }

    #[test]
    fn test_relative_route_rejected() {
        let toml = r#"
[[routes]]
pattern = "wp/v2"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_uncompilable_route_accepted() {
        let toml = r#"
[[routes]]
pattern = "/broken/(?P<id"
"#;
        assert!(load_config_from_str(toml).is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let toml = r#"
[server]
port = 0
"#;
        assert!(load_config_from_str(toml).is_err());
    }
}
