//! Data directory configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no data dir is configured
pub const DATA_PATH_ENV_VAR: &str = "HLTE_DAEMON_DATA_PATH";

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `data.csv`, `data.sqlite3` and per-record JSON files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the data directory: config, then environment, then platform default.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.resolve_with_env(std::env::var_os(DATA_PATH_ENV_VAR).map(PathBuf::from))
    }

    fn resolve_with_env(&self, env: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(dir) = env.filter(|d| !d.as_os_str().is_empty()) {
            return dir;
        }
        directories::ProjectDirs::from("net", "hlte", "daemon")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".hlte"))
    }
}

/// Create the data directory if needed and return its absolute form
pub fn prepare_data_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory '{}'", dir.display()))?;
    dir.canonicalize()
        .with_context(|| format!("Failed to resolve data directory '{}'", dir.display()))
}
