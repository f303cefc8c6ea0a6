//! Client configuration
//!
//! Configuration can be built in code, read from `PORTFOLIO_*` environment
//! variables, or loaded from a TOML, YAML or JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default backend origin
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Path prefix all backend endpoints live under
pub const DEFAULT_API_PREFIX: &str = "/api";

/// How long the availability probe waits before giving up
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;

/// Storage key holding the offline contact submissions
pub const DEFAULT_STORAGE_KEY: &str = "chinemerem_offline_contacts";

/// Default directory for the file-backed submission store
pub const DEFAULT_DATA_DIR: &str = ".portfolio";

/// Configuration for [`PortfolioClient`](crate::client::PortfolioClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://localhost:5000`
    pub base_url: String,

    /// Prefix joined onto `base_url` for every endpoint
    pub api_prefix: String,

    /// Availability probe timeout in milliseconds
    pub probe_timeout_ms: u64,

    /// Optional timeout for routed requests. `None` leaves them unbounded.
    pub request_timeout_ms: Option<u64>,

    /// Directory used by the file-backed store
    pub data_dir: PathBuf,

    /// Key of the offline submission log
    pub storage_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            request_timeout_ms: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            base_url: lookup("PORTFOLIO_BASE_URL").unwrap_or(defaults.base_url),
            api_prefix: lookup("PORTFOLIO_API_PREFIX").unwrap_or(defaults.api_prefix),
            probe_timeout_ms: lookup("PORTFOLIO_PROBE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.probe_timeout_ms),
            request_timeout_ms: lookup("PORTFOLIO_REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .or(defaults.request_timeout_ms),
            data_dir: lookup("PORTFOLIO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_key: lookup("PORTFOLIO_STORAGE_KEY").unwrap_or(defaults.storage_key),
        }
    }

    /// Load config from a file, picking the format from the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let config: Self = match ext.as_str() {
            "toml" => toml::from_str(&content)
                .map_err(|e| ClientError::config(format!("TOML error: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ClientError::config(format!("YAML error: {}", e)))?,
            "json" => serde_json::from_str(&content)
                .map_err(|e| ClientError::config(format!("JSON error: {}", e)))?,
            other => {
                return Err(ClientError::config(format!(
                    "unsupported config format: {:?}",
                    other
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::config("base_url must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        if self.probe_timeout_ms == 0 {
            return Err(ClientError::config("probe_timeout_ms must be greater than 0"));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ClientError::config("storage_key must not be empty"));
        }
        Ok(())
    }

    /// Full base for endpoint paths, e.g. `http://localhost:5000/api`
    pub fn api_base(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else if prefix.starts_with('/') {
            format!("{}{}", base, prefix)
        } else {
            format!("{}/{}", base, prefix)
        }
    }

    /// Probe timeout as a [`Duration`]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Routed request timeout as a [`Duration`], if any
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend origin
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the endpoint prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    /// Set the probe timeout
    pub fn probe_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.probe_timeout_ms = timeout;
        self
    }

    /// Set a timeout for routed requests
    pub fn request_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.request_timeout_ms = Some(timeout);
        self
    }

    /// Set the data directory for the file store
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the offline submission log key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
