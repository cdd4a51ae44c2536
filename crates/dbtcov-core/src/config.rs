//! Configuration schema (dbtcov.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::filter::FilterSpec;
use crate::thresholds::Thresholds;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "dbtcov.toml";

/// Main configuration structure
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to manifest.json, relative to the config file
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// dbt package to analyse
    #[serde(default)]
    pub package: Option<String>,

    /// Minimum coverage percentages
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Default node filters
    #[serde(default)]
    pub filters: FilterSpec,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: None,
            package: None,
            thresholds: Thresholds::default(),
            filters: FilterSpec::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Configured manifest path resolved against the project root
    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.manifest.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.project_root.join(p)
            }
        })
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
