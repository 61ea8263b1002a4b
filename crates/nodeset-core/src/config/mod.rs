//! Configuration management for nodeset.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `nodeset.toml` file
//! 3. User config `~/.config/nodeset/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog and remote discovery configuration.
    pub catalog: CatalogConfig,

    /// Document loading configuration.
    pub loader: LoaderConfig,

    /// HTTP fetch configuration.
    pub fetch: FetchConfig,

    /// Search and render configuration.
    pub search: SearchConfig,

    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./nodeset.toml` (project local)
    /// 2. `~/.config/nodeset/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("nodeset.toml").exists() {
            return Self::from_file("nodeset.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("nodeset").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NODESET_DISCOVERY_URL") {
            self.catalog.discovery_url = url;
        }
        if let Ok(url) = std::env::var("NODESET_RAW_BASE_URL") {
            self.catalog.raw_base_url = url;
        }
        if let Ok(flag) = std::env::var("NODESET_DISCOVERY_ENABLED") {
            if let Ok(enabled) = flag.parse() {
                self.catalog.discovery_enabled = enabled;
            }
        }

        if let Ok(n) = std::env::var("NODESET_MAX_CONCURRENCY") {
            if let Ok(n) = n.parse() {
                self.loader.max_concurrency = n;
            }
        }

        if let Ok(n) = std::env::var("NODESET_MAX_RETRIES") {
            if let Ok(n) = n.parse() {
                self.fetch.max_retries = n;
            }
        }

        if let Ok(dir) = std::env::var("NODESET_DATA_DIR") {
            self.storage.data_dir = dir;
        }
    }

    /// Reject values the rest of the system cannot work with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "loader.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.search.page_size == 0 {
            return Err(ConfigError::Invalid(
                "search.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Whether to merge remotely discovered entries into the catalog.
    pub discovery_enabled: bool,

    /// URL of the directory-tree listing used for discovery.
    pub discovery_url: String,

    /// Base URL that listing paths are joined onto.
    pub raw_base_url: String,

    /// File name suffix of loadable documents.
    pub document_suffix: String,

    /// How long a discovery listing is reused (seconds).
    pub discovery_ttl_secs: u64,

    /// How long to skip discovery after a failure (seconds).
    pub discovery_retry_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            discovery_enabled: true,
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            document_suffix: DEFAULT_DOCUMENT_SUFFIX.to_string(),
            discovery_ttl_secs: DEFAULT_DISCOVERY_TTL_SECS,
            discovery_retry_secs: DEFAULT_DISCOVERY_RETRY_SECS,
        }
    }
}

impl CatalogConfig {
    pub fn discovery_ttl(&self) -> Duration {
        Duration::from_secs(self.discovery_ttl_secs)
    }

    pub fn discovery_retry(&self) -> Duration {
        Duration::from_secs(self.discovery_retry_secs)
    }
}

/// Document loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Simultaneous fetches in a bulk load.
    pub max_concurrency: usize,

    /// Lifetime of parsed documents in the in-process cache (seconds).
    pub cache_ttl_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cache_ttl_secs: DEFAULT_DOCUMENT_CACHE_TTL_SECS,
        }
    }
}

impl LoaderConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// HTTP fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Retries after the first attempt on transport failure.
    pub max_retries: u32,

    /// Fixed pause between retries (milliseconds).
    pub retry_interval_ms: u64,

    /// Per-request timeout (seconds).
    pub timeout_secs: u64,

    /// User agent header.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Search and render configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hits returned per query.
    pub max_results: usize,

    /// Lines per rendered page.
    pub page_size: usize,

    /// Lifetime of rendered node text (seconds).
    pub render_ttl_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            page_size: DEFAULT_PAGE_SIZE,
            render_ttl_secs: DEFAULT_RENDER_TTL_SECS,
        }
    }
}

impl SearchConfig {
    pub fn render_ttl(&self) -> Duration {
        Duration::from_secs(self.render_ttl_secs)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for persisted documents and catalog overrides.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
        }
    }
}

impl StorageConfig {
    /// Get the data directory as a path.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}
