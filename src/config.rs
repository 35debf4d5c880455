//! Inventory configuration
//!
//! Read from an optional JSON file; command line flags win over file values.
//! Every field has a default so a partial file is fine.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::persistence::BadLinePolicy;

/// Data file used when nothing else is configured
pub const DEFAULT_DATA_FILE: &str = "vehicles.csv";

/// How a loaded file is combined with the live registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Drop the live records and take the file's records and ids
    #[default]
    Replace,
    /// Keep the live records and add the file's records under fresh ids
    Append,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Replace => "replace",
            LoadMode::Append => "append",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Default path for save and load
    pub data_file: PathBuf,

    pub load_mode: LoadMode,

    /// What load does with undecodable lines
    pub bad_lines: BadLinePolicy,

    /// Load `data_file` when the shell starts (if it exists)
    pub autoload: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            load_mode: LoadMode::Replace,
            bad_lines: BadLinePolicy::Abort,
            autoload: false,
        }
    }
}

/// Values given on the command line; `None` keeps the file/default value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_file: Option<PathBuf>,
    pub load_mode: Option<LoadMode>,
    pub bad_lines: Option<BadLinePolicy>,
    pub autoload: bool,
}

impl InventoryConfig {
    /// Parse a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: InventoryConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults, then the config file (if given), then the overrides
    pub fn resolve(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(data_file) = overrides.data_file {
            self.data_file = data_file;
        }
        if let Some(load_mode) = overrides.load_mode {
            self.load_mode = load_mode;
        }
        if let Some(bad_lines) = overrides.bad_lines {
            self.bad_lines = bad_lines;
        }
        // A flag can only switch autoload on
        self.autoload |= overrides.autoload;
    }
}
