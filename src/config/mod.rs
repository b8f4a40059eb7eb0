//! Configuration for the hlte daemon

mod http;
mod logging;
mod pipeline;
mod storage;

pub use http::{AuthConfig, HttpConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use storage::{prepare_data_dir, StorageConfig, DATA_PATH_ENV_VAR};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Main configuration for the daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API server configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Passphrase authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Where persisted formats live
    #[serde(default)]
    pub storage: StorageConfig,
    /// Fan-out channel sizing
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Render as TOML (used by `hlte init`)
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all configuration fields.
    ///
    /// Collects every error and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.http.listen_addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "http.listen_addr '{}' is not a valid socket address",
                self.http.listen_addr
            ));
        }

        if let Some(hash) = self.auth.passphrase_sha512.as_deref() {
            if !hash.is_empty() && (hash.len() != 128 || !hash.chars().all(|c| c.is_ascii_hexdigit())) {
                errors.push("auth.passphrase_sha512 must be a 128-character hex digest".to_string());
            }
        }

        if self.pipeline.ingest_channel_capacity == 0 {
            errors.push("pipeline.ingest_channel_capacity must be positive".to_string());
        }
        if self.pipeline.sink_channel_capacity == 0 {
            errors.push("pipeline.sink_channel_capacity must be positive".to_string());
        }

        if let Some(dir) = &self.storage.data_dir {
            if dir.as_os_str().is_empty() {
                errors.push("storage.data_dir must not be empty when set".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
