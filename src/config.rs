use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::recommendation::update::UpdatePolicy;
use crate::source::types::SourceKind;

// =============================================================================
// Defaults
// =============================================================================

/// Config file looked up in the project directory
pub const DEFAULT_CONFIG_FILE: &str = "version-recommender.json";

/// Override store directory, relative to the project directory
pub const DEFAULT_OVERRIDE_DIR: &str = ".version-recommender";

/// File extension of override stores
pub const OVERRIDE_FILE_EXTENSION: &str = "version";

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommenderConfig {
    /// Where override stores live, relative to the project directory
    pub override_dir: PathBuf,
    pub log: LogConfig,
    /// Providers in fallback order
    pub providers: Vec<ProviderConfig>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            override_dir: PathBuf::from(DEFAULT_OVERRIDE_DIR),
            log: LogConfig::default(),
            providers: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `debug` or `version_recommender=trace`
    pub level: Option<String>,
    /// Write logs to [`log_path`] instead of stderr
    pub file: bool,
}

/// One provider of the chain
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Source file, relative to the project directory
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Inline `group:name` to version map, for `properties` providers
    #[serde(default)]
    pub versions: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub adaptable: bool,
    #[serde(default)]
    pub local_qualifier: Option<String>,
    #[serde(default)]
    pub snapshot_qualifier: Option<String>,
    #[serde(default)]
    pub update: Option<UpdateConfig>,
}

/// Where `update` looks for newer versions
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateConfig {
    /// Maven repository base URL
    pub repository: Option<String>,
    /// Property file listing available versions, relative to the project directory
    pub file: Option<PathBuf>,
    pub policy: UpdatePolicy,
}

impl RecommenderConfig {
    /// Load the config file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override store of provider `name` within `project_dir`
    pub fn store_path(&self, project_dir: &Path, name: &str) -> PathBuf {
        project_dir
            .join(&self.override_dir)
            .join(format!("{}.{}", name, OVERRIDE_FILE_EXTENSION))
    }
}

/// Returns the path to the data directory for version-recommender.
/// Uses $XDG_DATA_HOME/version-recommender if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-recommender,
/// or ./version-recommender if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("version-recommender.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-recommender")
}
