//! Client Configuration
//!
//! The only externally visible setting is the backend base URL. It comes
//! from a JSON file or from the `FILMDESK_API_URL` environment variable,
//! the variable winning when both are present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "FILMDESK_API_URL";

/// How long a toast stays up after its last update
pub const DEFAULT_TOAST_MS: u64 = 4000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("api_url is not set (use the config file or {})", API_URL_ENV)]
    MissingApiUrl,
    #[error("api_url must start with http:// or https://, got {0:?}")]
    InvalidApiUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_url: String,
    /// No timeout beyond the network stack's when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_toast_ms")]
    pub toast_duration_ms: u64,
}

fn default_toast_ms() -> u64 {
    DEFAULT_TOAST_MS
}

impl ClientConfig {
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Self {
            api_url: api_url.to_string(),
            request_timeout_secs: None,
            toast_duration_ms: DEFAULT_TOAST_MS,
        }
        .validated()
    }

    /// Read a JSON config file, then apply the environment override
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ClientConfig = serde_json::from_str(&content)?;
        config.with_overrides(|key| std::env::var(key).ok()).validated()
    }

    /// Build from the environment alone
    pub fn from_env() -> Result<Self, ConfigError> {
        Self {
            api_url: String::new(),
            request_timeout_secs: None,
            toast_duration_ms: DEFAULT_TOAST_MS,
        }
        .with_overrides(|key| std::env::var(key).ok())
        .validated()
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let url = self.api_url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(url));
        }
        self.api_url = url;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        let config = ClientConfig::new("https://api.example.com/v1/").unwrap();
        assert_eq!(config.api_url, "https://api.example.com/v1");
        assert_eq!(config.toast_duration(), Duration::from_millis(DEFAULT_TOAST_MS));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_rejects_missing_or_bad_url() {
        assert!(matches!(ClientConfig::new("  "), Err(ConfigError::MissingApiUrl)));
        assert!(matches!(ClientConfig::new("ftp://x"), Err(ConfigError::InvalidApiUrl(_))));
    }

    #[test]
    fn test_load_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filmdesk.json");
        std::fs::write(&path, r#"{ "api_url": "http://localhost:4000", "request_timeout_secs": 15 }"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(config.api_url, "http://localhost:4000");
        }
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.toast_duration_ms, DEFAULT_TOAST_MS);
    }

    #[test]
    fn test_env_override_wins() {
        let config = ClientConfig::new("http://from-file")
            .unwrap()
            .with_overrides(|key| (key == API_URL_ENV).then(|| "https://from-env/".to_string()))
            .validated()
            .unwrap();
        assert_eq!(config.api_url, "https://from-env");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/filmdesk.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
