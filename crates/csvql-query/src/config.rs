//! Run configuration
//!
//! A run is fully described by [`RunConfig`]. It is assembled from layers,
//! each a [`ConfigFile`] whose unset fields fall through to the layer below:
//! command-line flags, then environment, then an optional TOML file, then
//! the built-in defaults.
//!
//! # Configuration Format
//!
//! ```toml
//! data_dir = "data/processed"   # directory holding the dataset
//! sql_dir = "sql"               # directory holding the script
//! dataset = "other.csv"         # explicit dataset path, overrides data_dir
//! script = "adhoc.sql"          # explicit script path, overrides sql_dir
//! table = "customers"
//! split_mode = "naive"          # naive, quote_aware
//! format = "text"               # text, json
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::SplitMode;
use crate::presenter::ReportFormat;

pub const DEFAULT_DATA_DIR: &str = "data/processed";
pub const DEFAULT_SQL_DIR: &str = "sql";
pub const DEFAULT_DATASET_FILE: &str = "processed_customer_data.csv";
pub const DEFAULT_SCRIPT_FILE: &str = "queries.sql";
pub const DEFAULT_TABLE_NAME: &str = "customers";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything a run needs, fully resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub dataset_path: PathBuf,
    pub script_path: PathBuf,
    /// Name of the table the dataset is loaded into
    pub table_name: String,
    pub split_mode: SplitMode,
    pub format: ReportFormat,
}

impl RunConfig {
    /// Default file names inside the given data and SQL directories
    pub fn from_dirs(data_dir: impl AsRef<Path>, sql_dir: impl AsRef<Path>) -> Self {
        Self {
            dataset_path: data_dir.as_ref().join(DEFAULT_DATASET_FILE),
            script_path: sql_dir.as_ref().join(DEFAULT_SCRIPT_FILE),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            split_mode: SplitMode::default(),
            format: ReportFormat::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_name.trim().is_empty() {
            return Err(ConfigError::Invalid("table name must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from_dirs(DEFAULT_DATA_DIR, DEFAULT_SQL_DIR)
    }
}

/// One configuration layer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub sql_dir: Option<PathBuf>,
    pub dataset: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub table: Option<String>,
    pub split_mode: Option<SplitMode>,
    pub format: Option<ReportFormat>,
}

impl ConfigFile {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Overlay `higher` on top of this layer; fields set in `higher` win.
    ///
    /// A directory and its explicit file path travel together: a layer that
    /// sets either one replaces both from the layer below.
    pub fn merge(self, higher: ConfigFile) -> ConfigFile {
        let (data_dir, dataset) = if higher.data_dir.is_some() || higher.dataset.is_some() {
            (higher.data_dir, higher.dataset)
        } else {
            (self.data_dir, self.dataset)
        };
        let (sql_dir, script) = if higher.sql_dir.is_some() || higher.script.is_some() {
            (higher.sql_dir, higher.script)
        } else {
            (self.sql_dir, self.script)
        };

        ConfigFile {
            data_dir,
            sql_dir,
            dataset,
            script,
            table: higher.table.or(self.table),
            split_mode: higher.split_mode.or(self.split_mode),
            format: higher.format.or(self.format),
        }
    }

    /// Fill whatever is still unset from the defaults.
    ///
    /// An explicit `dataset`/`script` path takes precedence over the
    /// corresponding directory.
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        let data_dir = self
            .data_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let sql_dir = self.sql_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_SQL_DIR));
        let defaults = RunConfig::from_dirs(&data_dir, &sql_dir);

        let config = RunConfig {
            dataset_path: self.dataset.unwrap_or(defaults.dataset_path),
            script_path: self.script.unwrap_or(defaults.script_path),
            table_name: self.table.unwrap_or(defaults.table_name),
            split_mode: self.split_mode.unwrap_or(defaults.split_mode),
            format: self.format.unwrap_or(defaults.format),
        };
        config.validate()?;
        Ok(config)
    }
}
