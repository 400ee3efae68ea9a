//! # Configuration
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config direction.toml`)
//! 3. CLI flags, and for security settings, environment variables
//!
//! ## File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [storage]
//! backend = "redb"          # or "memory"
//! path = "direction.redb"
//!
//! [security]
//! cors_origins = "http://localhost:3000"
//! rate_limit = 100          # requests/second, 0 disables
//! ```
//!
//! ## Environment Variables
//!
//! - `DIRECTION_CORS_ORIGINS`: overrides `security.cors_origins`
//! - `DIRECTION_RATE_LIMIT`: overrides `security.rate_limit`
//! - `DIRECTION_API_KEY`: enables bearer authentication (env only)
//! - `DIRECTION_LOG_FORMAT`: `json` for machine-parseable logs

use direction_core::DirectionError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum config file size (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Default requests per second for the global rate limiter.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Which store to open and where.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// "redb" (persistent) or "memory" (volatile).
    pub backend: String,
    /// Database file for the redb backend.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "redb".to_string(),
            path: PathBuf::from("direction.redb"),
        }
    }
}

/// CORS and rate limiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Comma-separated origins, or "*". `None` means localhost only.
    pub cors_origins: Option<String>,
    /// Requests per second. `None` means the default, 0 disables.
    pub rate_limit: Option<u32>,
}

impl SecurityConfig {
    /// Apply `DIRECTION_CORS_ORIGINS` and `DIRECTION_RATE_LIMIT`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(origins) = std::env::var("DIRECTION_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(limit) = std::env::var("DIRECTION_RATE_LIMIT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            self.rate_limit = Some(limit);
        }
        self
    }

    /// Effective requests per second (0 = disabled).
    #[must_use]
    pub fn effective_rate_limit(&self) -> u32 {
        self.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT)
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Parse a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self, DirectionError> {
        toml::from_str(text).map_err(|e| DirectionError::Config(e.to_string()))
    }

    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, DirectionError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            DirectionError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(DirectionError::Config(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            DirectionError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9100

            [security]
            rate_limit = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.backend, "redb");
        assert_eq!(config.security.effective_rate_limit(), 0);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = AppConfig::from_toml_str("[server]\nhots = \"0.0.0.0\"\n").unwrap_err();
        assert!(matches!(err, DirectionError::Config(_)));
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("direction.toml");
        std::fs::write(&path, "[storage]\nbackend = \"memory\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage.backend, "memory");
    }

    #[test]
    fn load_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("nope.toml"))).is_err());
    }
}
