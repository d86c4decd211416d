use std::{collections::HashMap, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration key for the URL of the repository service
pub const URL: &str = "url";

/// Configuration key for the name of the repository on the service
pub const REPO: &str = "repo";

/// Configuration key for the comma-separated files to load into an in-memory repository
pub const FILES: &str = "files";

/// Configuration key for the data directory of a persistent local repository
pub const DIR: &str = "dir";

/// String-keyed configuration map handed to a data source factory.
///
/// Values are arbitrary; a `null` value counts as absent.
pub type DataSourceConfig = HashMap<String, Value>;

/// Backend chosen for a configuration map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    /// Repository hosted by a remote Sesame/RDF4J service
    Remote { url: String, repo: String },
    /// Transient in-memory repository loaded from files
    BulkLoad { files: Vec<PathBuf> },
    /// On-disk repository rooted at a directory
    Persistent { dir: PathBuf },
}

impl BackendSelection {
    /// Pick the backend for `config`, or `None` if the map is not sufficient.
    ///
    /// Remote wins over BulkLoad, which wins over Persistent.
    pub fn from_config(config: &DataSourceConfig) -> Option<Self> {
        let url = config_value(config, URL);
        let repo = config_value(config, REPO);

        if let (Some(url), Some(repo)) = (url, repo) {
            return Some(Self::Remote { url, repo });
        }

        if let Some(files) = config_value(config, FILES) {
            return Some(Self::BulkLoad {
                files: split_files(&files),
            });
        }

        config_value(config, DIR).map(|dir| Self::Persistent {
            dir: PathBuf::from(dir),
        })
    }

    /// Backend name used in logs, metrics and errors
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Remote { .. } => "remote",
            Self::BulkLoad { .. } => "memory",
            Self::Persistent { .. } => "persistent",
        }
    }
}

/// Read a key as a string. Strings are taken verbatim, other values use their JSON text.
pub fn config_value(config: &DataSourceConfig, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

fn split_files(files: &str) -> Vec<PathBuf> {
    files
        .split(',')
        .map(str::trim)
        .filter(|file| !file.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Options applied to every repository a factory builds
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RepositoryOptions {
    /// Optional username for HTTP basic authentication (remote only)
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password for HTTP basic authentication (remote only)
    #[serde(default)]
    pub password: Option<String>,

    /// Timeout configuration for different operation types
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Maximum concurrent operations on a data source.
    #[serde(default = "default_max_concurrent_operations")]
    pub max_concurrent_operations: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            timeouts: TimeoutConfig::default(),
            max_concurrent_operations: default_max_concurrent_operations(),
        }
    }
}

/// Timeout configuration for repository operations
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Timeout for CONSTRUCT queries in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_ms: u64,

    /// Timeout for updates and statement uploads in milliseconds
    #[serde(default = "default_update_timeout_ms")]
    pub update_ms: u64,

    /// Timeout for ASK queries in milliseconds
    #[serde(default = "default_ask_timeout_ms")]
    pub ask_ms: u64,

    /// Timeout for protocol and repository checks in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            query_ms: default_query_timeout_ms(),
            update_ms: default_update_timeout_ms(),
            ask_ms: default_ask_timeout_ms(),
            connect_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_query_timeout_ms() -> u64 {
    60_000
}

fn default_update_timeout_ms() -> u64 {
    300_000
}

fn default_ask_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrent_operations() -> usize {
    16
}

impl TimeoutConfig {
    /// Get query timeout as Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_ms)
    }

    /// Get update timeout as Duration
    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_ms)
    }

    /// Get ask timeout as Duration
    pub fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.ask_ms)
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}
