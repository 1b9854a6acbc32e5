//! Application configuration.
//!
//! Data and log locations for the ETL run. Defaults mirror the project
//! layout (`data/raw`, `data/processed`, `data/backup`, `logs/`); each can be
//! overridden from the environment, and the binary loads a `.env` file first.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::DEFAULT_INVALID_TOKENS;

/// Base directory override.
pub const ENV_BASE_DIR: &str = "RETAIL_ETL_BASE_DIR";
/// Raw file name override (file inside `data/raw`).
pub const ENV_RAW_FILE: &str = "RETAIL_ETL_RAW_FILE";
/// Log directory override.
pub const ENV_LOG_DIR: &str = "RETAIL_ETL_LOG_DIR";
/// Log file name override.
pub const ENV_LOG_FILE: &str = "RETAIL_ETL_LOG_FILE";

/// Default raw transactions file.
pub const DEFAULT_RAW_FILE: &str = "retail_store.csv";
/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "project.log";

/// Resolved paths for one ETL run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlConfig {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub raw_file_name: String,
    pub log_dir: PathBuf,
    pub log_file: String,
}

impl EtlConfig {
    /// Layout rooted at `base_dir` with default file names.
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let data_dir = base_dir.join("data");
        Self {
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
            backup_dir: data_dir.join("backup"),
            data_dir,
            raw_file_name: DEFAULT_RAW_FILE.to_string(),
            log_dir: base_dir.join("logs"),
            log_file: DEFAULT_LOG_FILE.to_string(),
            base_dir,
        }
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = match lookup(ENV_BASE_DIR) {
            Some(dir) => PathBuf::from(non_empty(ENV_BASE_DIR, dir)?),
            None => PathBuf::from("."),
        };

        let mut config = Self::with_base_dir(base_dir);

        if let Some(name) = lookup(ENV_RAW_FILE) {
            config.raw_file_name = file_name(ENV_RAW_FILE, name)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(non_empty(ENV_LOG_DIR, dir)?);
        }
        if let Some(name) = lookup(ENV_LOG_FILE) {
            config.log_file = file_name(ENV_LOG_FILE, name)?;
        }

        Ok(config)
    }

    /// Full path of the raw transactions file.
    pub fn raw_file_path(&self) -> PathBuf {
        self.raw_dir.join(&self.raw_file_name)
    }

    /// Full path of the log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self::with_base_dir(".")
    }
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidPath {
            key: key.to_string(),
            message: "value is empty".to_string(),
        });
    }
    Ok(value)
}

fn file_name(key: &str, value: String) -> Result<String, ConfigError> {
    let value = non_empty(key, value)?;
    if value.contains('/') || value.contains('\\') {
        return Err(ConfigError::InvalidPath {
            key: key.to_string(),
            message: format!("'{}' must be a file name, not a path", value),
        });
    }
    Ok(value)
}

/// Options for the transformation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Tokens treated as missing by the Data Quality Auditor
    pub invalid_tokens: Vec<String>,

    /// Rows logged as a preview after extract and transform
    pub preview_rows: usize,

    /// Skip the cleaned-record schema check
    pub skip_validation: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            invalid_tokens: DEFAULT_INVALID_TOKENS.iter().map(|t| t.to_string()).collect(),
            preview_rows: 5,
            skip_validation: false,
        }
    }
}
