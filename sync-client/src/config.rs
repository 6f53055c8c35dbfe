//! Configuration loading for the update engine.
//!
//! Configuration is loaded from a TOML file (default: `upsync.toml`).
//! Every section and field is optional; missing values use defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for the update engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Difference recovery configuration.
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Periodic checkpoint configuration.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Container inbox configuration.
    #[serde(default)]
    pub inbox: InboxConfig,
}

/// Difference recovery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// Channel difference page size for user accounts (default: 100).
    #[serde(default = "default_user_diff_limit")]
    pub user_diff_limit: u32,
    /// Channel difference page size for service accounts (default: 1000).
    #[serde(default = "default_service_diff_limit")]
    pub service_diff_limit: u32,
}

/// Periodic checkpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    /// Enable the checkpoint task (default: true).
    #[serde(default = "default_checkpoint_enabled")]
    pub enabled: bool,
    /// Checkpoint interval in seconds (default: 60).
    #[serde(default = "default_checkpoint_interval")]
    pub interval_secs: u64,
}

/// Container inbox configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InboxConfig {
    /// Containers buffered before senders wait (default: 256).
    #[serde(default = "default_inbox_capacity")]
    pub capacity: usize,
}

// Default value functions
fn default_user_diff_limit() -> u32 {
    100
}

fn default_service_diff_limit() -> u32 {
    1000
}

fn default_checkpoint_enabled() -> bool {
    true
}

fn default_checkpoint_interval() -> u64 {
    60
}

fn default_inbox_capacity() -> usize {
    256
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            user_diff_limit: default_user_diff_limit(),
            service_diff_limit: default_service_diff_limit(),
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: default_checkpoint_enabled(),
            interval_secs: default_checkpoint_interval(),
        }
    }
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            capacity: default_inbox_capacity(),
        }
    }
}

impl RecoveryConfig {
    /// Channel difference page size for an account kind.
    pub fn diff_limit(&self, is_service_account: bool) -> u32 {
        if is_service_account {
            self.service_diff_limit
        } else {
            self.user_diff_limit
        }
    }
}

impl EngineConfig {
    /// Read an engine configuration from a TOML file on disk.
    ///
    /// A file with no sections yields [`EngineConfig::default`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse an engine configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Why an engine configuration file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("cannot read engine config at {}", path.display())]
    Unreadable {
        /// File that was requested.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid engine TOML.
    #[error("engine config at {} is invalid: {source}", path.display())]
    Invalid {
        /// File that was parsed.
        path: PathBuf,
        /// TOML failure, with line and column.
        #[source]
        source: toml::de::Error,
    },
}
