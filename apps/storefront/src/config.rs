//! # Server Configuration
//!
//! Settings for the HTTP server, read from an optional TOML file and then
//! overridden by environment variables.
//!
//! ## Environment Variables
//!
//! - `STOREFRONT_API_KEY`: Bearer key for admin routes (unset or empty disables auth)
//! - `STOREFRONT_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for all
//! - `STOREFRONT_RATE_LIMIT`: Requests per second (0 disables rate limiting)
//! - `STOREFRONT_BODY_LIMIT`: Maximum request body size in bytes
//! - `STOREFRONT_MEDIA_DIR`: Root directory of stored media files
//!
//! ## File Format
//!
//! ```toml
//! api_key = "change-me"
//! cors_origins = ["https://shop.example"]
//! rate_limit = 50
//! body_limit = 1048576
//! media_dir = "/var/lib/storefront/media"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storefront_core::StoreError;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default request body limit (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Maximum size of a configuration file (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Admin API key. `None` leaves admin routes open.
    pub api_key: Option<String>,
    /// Allowed CORS origins. `None` allows localhost only.
    pub cors_origins: Option<Vec<String>>,
    /// Requests per second across all clients; 0 disables limiting.
    pub rate_limit: u32,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Directory the media host deletes replaced images from.
    pub media_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            body_limit: DEFAULT_BODY_LIMIT,
            media_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load the configuration file (if any), then apply the process
    /// environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, StoreError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            StoreError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(StoreError::InvalidInput(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            StoreError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
        let mut config: Self = toml::from_str(text)
            .map_err(|e| StoreError::DeserializationError(format!("Invalid config: {e}")))?;
        config.api_key = config.api_key.filter(|k| !k.is_empty());
        Ok(config)
    }

    /// Apply `STOREFRONT_*` variables from `lookup`.
    ///
    /// Unparseable numeric values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("STOREFRONT_API_KEY") {
            self.api_key = Some(key).filter(|k| !k.is_empty());
        }

        if let Some(origins) = lookup("STOREFRONT_CORS_ORIGINS") {
            self.cors_origins = Some(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }

        if let Some(raw) = lookup("STOREFRONT_RATE_LIMIT") {
            match raw.trim().parse() {
                Ok(rps) => self.rate_limit = rps,
                Err(_) => tracing::warn!("Ignoring invalid STOREFRONT_RATE_LIMIT '{}'", raw),
            }
        }

        if let Some(raw) = lookup("STOREFRONT_BODY_LIMIT") {
            match raw.trim().parse() {
                Ok(bytes) => self.body_limit = bytes,
                Err(_) => tracing::warn!("Ignoring invalid STOREFRONT_BODY_LIMIT '{}'", raw),
            }
        }

        if let Some(dir) = lookup("STOREFRONT_MEDIA_DIR").filter(|d| !d.is_empty()) {
            self.media_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Check if admin routes require a key.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.api_key.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
