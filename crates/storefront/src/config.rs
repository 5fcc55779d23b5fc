//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SARTORIA_API_URL` - Base URL of the backend API (e.g., <https://api.sartoria.example/v1>)
//!
//! ## Optional
//! - `SARTORIA_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `SARTORIA_DATA_DIR` - Directory for durable client state (default: .sartoria)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default request timeout. Bounded so a hung request cannot leave the
/// session loading forever.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default directory for the durable storage file.
const DEFAULT_DATA_DIR: &str = ".sartoria";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend API. Always ends with a trailing slash so
    /// relative paths join underneath it.
    pub api_base_url: Url,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
    /// Directory holding the durable storage file (tokens, cart snapshot).
    pub data_dir: PathBuf,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url("SARTORIA_API_URL", &get_required_env("SARTORIA_API_URL")?)?;
        let timeout_secs = get_env_or_default("SARTORIA_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SARTORIA_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        let data_dir = PathBuf::from(get_env_or_default("SARTORIA_DATA_DIR", DEFAULT_DATA_DIR));

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(timeout_secs),
            data_dir,
        })
    }

    /// Build a configuration programmatically (tests, embedding).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_base_url` is not a valid URL.
    pub fn new(api_base_url: &str, data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            data_dir: data_dir.into(),
        })
    }

    /// Path of the durable storage file inside `data_dir`.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storefront.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL, normalizing it to end with a trailing slash.
///
/// Without the trailing slash `Url::join` would replace the final path
/// segment instead of appending underneath it.
fn parse_base_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };

    Url::parse(&normalized).map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST", "https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("TEST", "https://api.example.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_parse_base_url_invalid() {
        let err = parse_base_url("TEST", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "TEST"));
    }

    #[test]
    fn test_new_defaults() {
        let config = StorefrontConfig::new("http://localhost:4000/api", "/tmp/sartoria").unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/sartoria/storefront.json")
        );
    }

    #[test]
    fn test_join_under_base() {
        let config = StorefrontConfig::new("https://api.example.com/v1", ".").unwrap();
        let joined = config.api_base_url.join("auth/login").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/v1/auth/login");
    }
}
