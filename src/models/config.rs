// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Collection behavior settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Upstream feed endpoints and credentials
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Live submission endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistent store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.collector.user_agent.trim().is_empty() {
            return Err(AppError::validation("collector.user_agent is empty"));
        }
        if self.collector.page_timeout_secs == 0 {
            return Err(AppError::validation(
                "collector.page_timeout_secs must be > 0",
            ));
        }
        if self.collector.probe_timeout_secs == 0 {
            return Err(AppError::validation(
                "collector.probe_timeout_secs must be > 0",
            ));
        }
        if self.collector.kit_timeout_secs == 0 {
            return Err(AppError::validation(
                "collector.kit_timeout_secs must be > 0",
            ));
        }
        if self.collector.workers == 0 {
            return Err(AppError::validation("collector.workers must be > 0"));
        }
        if self.collector.max_links_per_directory == 0 {
            return Err(AppError::validation(
                "collector.max_links_per_directory must be > 0",
            ));
        }
        if self.collector.kit_directory.trim().is_empty() {
            return Err(AppError::validation("collector.kit_directory is empty"));
        }
        if self.server.workers == 0 {
            return Err(AppError::validation("server.workers must be > 0"));
        }
        if self.feeds.openphish.url.is_empty() && self.feeds.phishtank.url.is_empty() {
            log::warn!("No feed URLs configured; batch runs will only see submitted samples");
        }
        Ok(())
    }
}

/// Collection behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// User-Agent header for all outbound requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Timeout for the sample page fetch, in seconds
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for open-directory probes, in seconds
    #[serde(default = "defaults::probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for kit archive downloads, in seconds
    #[serde(default = "defaults::kit_timeout")]
    pub kit_timeout_secs: u64,

    /// Number of concurrent samples processed in a batch run
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Subdirectory fan-out cap per directory listing
    #[serde(default = "defaults::max_links_per_directory")]
    pub max_links_per_directory: usize,

    /// Directory downloaded kit archives are written to
    #[serde(default = "defaults::kit_directory")]
    pub kit_directory: String,

    /// Hosts excluded from analysis
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Whether to run the trailing `<dir>.zip` guess pass after the
    /// crawl queue drains
    #[serde(default = "defaults::guess_archives")]
    pub guess_archives: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            page_timeout_secs: defaults::page_timeout(),
            probe_timeout_secs: defaults::probe_timeout(),
            kit_timeout_secs: defaults::kit_timeout(),
            workers: defaults::workers(),
            max_links_per_directory: defaults::max_links_per_directory(),
            kit_directory: defaults::kit_directory(),
            blacklist: Vec::new(),
            guess_archives: defaults::guess_archives(),
        }
    }
}

/// Upstream feed settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default)]
    pub openphish: OpenphishConfig,

    #[serde(default)]
    pub phishtank: PhishtankConfig,
}

/// Full-dump feed settings. An empty URL disables the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenphishConfig {
    #[serde(default)]
    pub url: String,

    /// Feed request timeout, in seconds
    #[serde(default = "defaults::feed_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenphishConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: defaults::feed_timeout(),
        }
    }
}

/// Paginated feed settings. An empty URL disables the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhishtankConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Cold-start offset used when the index has no prior record for
    /// this feed
    #[serde(default)]
    pub last_seen: String,

    /// Feed request timeout, in seconds
    #[serde(default = "defaults::feed_timeout")]
    pub timeout_secs: u64,
}

impl Default for PhishtankConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            last_seen: String::new(),
            timeout_secs: defaults::feed_timeout(),
        }
    }
}

/// Live submission endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Number of long-lived queue workers
    #[serde(default = "defaults::server_workers")]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            workers: defaults::server_workers(),
        }
    }
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sample and kit record files
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

mod defaults {
    // Collector defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_1) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/54.0.2840.98 Safari/537.36"
            .into()
    }
    pub fn page_timeout() -> u64 {
        3
    }
    pub fn probe_timeout() -> u64 {
        5
    }
    pub fn kit_timeout() -> u64 {
        5
    }
    pub fn workers() -> usize {
        8
    }
    pub fn max_links_per_directory() -> usize {
        10
    }
    pub fn kit_directory() -> String {
        "kits".into()
    }
    pub fn guess_archives() -> bool {
        true
    }

    // Feed defaults
    pub fn feed_timeout() -> u64 {
        5
    }

    // Server defaults
    pub fn host() -> String {
        "127.0.0.1".into()
    }
    pub fn port() -> u16 {
        8080
    }
    pub fn server_workers() -> usize {
        4
    }

    // Storage defaults
    pub fn data_dir() -> String {
        "data".into()
    }
}
