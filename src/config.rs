//! Warehouse settings.
//!
//! Values resolve in layers: built-in defaults, then an optional JSON file.
//! The CLI binds `WAREHOUSE_SOURCE` / `WAREHOUSE_DIR` to its path flags, and
//! either of those wins over what is resolved here.

use crate::error::{Result, ResultExt as _, WarehouseError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE: &str = "data/MundoEcommerce.parquet";
pub const DEFAULT_WAREHOUSE_DIR: &str = "data/warehouse";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Raw order dataset used for builds and rebuilds
    pub source_path: PathBuf,
    /// Directory holding the seven table files
    pub warehouse_dir: PathBuf,
    /// Also write rotating log files under the platform data directory
    pub log_to_file: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE),
            warehouse_dir: PathBuf::from(DEFAULT_WAREHOUSE_DIR),
            log_to_file: false,
        }
    }
}

impl WarehouseConfig {
    /// Parse settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WarehouseError::Config(format!("{e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Settings from `file` if given, otherwise the defaults.
    pub fn resolve(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
