//! Configuration for a node store root.

use crate::backing::TEMP_EXTENSION;
use crate::error::{NodeStoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file inside a store root.
pub const CONFIG_FILE: &str = "nodestore.toml";

/// Top-level node store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Storage-related configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Workspace defaults for hosting tools.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Load configuration from `<root>/nodestore.toml`.
    ///
    /// Returns the defaults when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| NodeStoreError::ConfigError(format!("failed to read config: {}", e)))?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                NodeStoreError::ConfigError(format!("failed to parse config: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to `<root>/nodestore.toml`.
    pub fn save(&self, root: &Path) -> Result<()> {
        self.validate()?;
        let path = root.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).map_err(|e| {
            NodeStoreError::ConfigError(format!("failed to serialize config: {}", e))
        })?;
        fs::create_dir_all(root)
            .map_err(|e| NodeStoreError::ConfigError(format!("failed to create root: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| NodeStoreError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let ext = &self.storage.record_extension;
        if ext.is_empty() || ext.contains(['/', '.']) {
            return Err(NodeStoreError::ConfigError(format!(
                "record_extension must be a plain extension, got '{}'",
                ext
            )));
        }
        if ext.eq_ignore_ascii_case(TEMP_EXTENSION) {
            return Err(NodeStoreError::ConfigError(format!(
                "record_extension '{}' is reserved for in-flight writes",
                ext
            )));
        }
        Ok(())
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Fsync each written file and its directory (default: true).
    pub fsync: bool,

    /// Extension of node record files, `node.<ext>` (default: "json").
    pub record_extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            fsync: true,
            record_extension: "json".to_string(),
        }
    }
}

/// Workspace defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace used when a caller doesn't name one (default: "default").
    pub default: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            default: "default".to_string(),
        }
    }
}
