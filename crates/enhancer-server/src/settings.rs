// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Server configuration loading.

use std::path::Path;

use enhancer_core::config::ServerConfig;
use enhancer_core::error::{EnhancerError, Result};
use tracing::{debug, info};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "ENHANCER_CONFIG";

/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "ENHANCER_PORT";

/// Load configuration from the environment.
pub fn from_env() -> Result<ServerConfig> {
    let path = std::env::var_os(CONFIG_ENV);
    let port = std::env::var(PORT_ENV).ok();
    load(path.as_deref().map(Path::new), port.as_deref())
}

/// Build a [`ServerConfig`] from an optional JSON file and an optional port
/// override. Without a file every field takes its default; a file may omit
/// any field.
pub fn load(path: Option<&Path>, port_override: Option<&str>) -> Result<ServerConfig> {
    let mut config = match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            let config: ServerConfig = serde_json::from_str(&data)?;
            info!(path = %path.display(), "Loaded server configuration");
            config
        }
        None => {
            debug!("No configuration file, using defaults");
            ServerConfig::default()
        }
    };

    if let Some(port) = port_override {
        config.port = port.trim().parse().map_err(|_| {
            EnhancerError::InvalidConfig(format!("{PORT_ENV} must be a port number (got {port:?})"))
        })?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load(None, None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn file_fields_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(&path, r#"{"port": 9100, "allowed_origins": ["https://a.example"]}"#)
            .unwrap();

        let config = load(Some(&path), None).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.allowed_origins, vec!["https://a.example".to_string()]);
        assert_eq!(config.max_request_bytes, ServerConfig::default().max_request_bytes);
    }

    #[test]
    fn port_override_wins() {
        let config = load(None, Some("8123")).unwrap();
        assert_eq!(config.port, 8123);
        assert!(matches!(
            load(None, Some("eighty")),
            Err(EnhancerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_or_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(Some(&dir.path().join("absent.json")), None),
            Err(EnhancerError::Io(_))
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load(Some(&path), None),
            Err(EnhancerError::Serialization(_))
        ));
    }
}
