//! Run configuration, loaded from `fundseries.toml`.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. CLI flags override individual fields after loading.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use fundseries_core::series::DEFAULT_SAMPLE_LIMIT;
use fundseries_core::Category;

/// Errors that abort a run before any instrument is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-category overwrite flags. A set flag rewrites existing output files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverwritePolicy {
    pub uitf: bool,
    pub mutual_fund: bool,
    pub etf: bool,
    pub index: bool,
}

impl OverwritePolicy {
    pub fn all() -> Self {
        Self {
            uitf: true,
            mutual_fund: true,
            etf: true,
            index: true,
        }
    }

    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::Uitf => self.uitf,
            Category::MutualFund => self.mutual_fund,
            Category::Etf => self.etf,
            Category::Index => self.index,
        }
    }
}

/// Settings for the UITF NAVPU endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UitfConfig {
    pub base_url: String,
    /// First day of the requested window.
    pub from: NaiveDate,
    /// Last day of the requested window.
    pub to: NaiveDate,
    pub timeout_secs: u64,
}

impl UitfConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UitfConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.uitf.com.ph/daily_navpu_details_json.php".into(),
            from: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
            to: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or_default(),
            timeout_secs: 30,
        }
    }
}

/// Everything a run needs besides the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Where file-sourced payloads live.
    pub raw_dir: PathBuf,
    /// Where canonical series files are written.
    pub data_dir: PathBuf,
    /// Process instruments on the rayon pool.
    pub parallel: bool,
    /// Reject ratio above which a warning is logged.
    pub max_reject_ratio: f64,
    /// Turn an exceeded reject ratio into an instrument failure.
    pub fail_on_reject_ratio: bool,
    /// Rejected records kept per instrument for reporting.
    pub sample_limit: usize,
    /// Skip instruments that need the network.
    pub offline: bool,
    pub overwrite: OverwritePolicy,
    pub uitf: UitfConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw-data"),
            data_dir: PathBuf::from("data"),
            parallel: true,
            max_reject_ratio: 0.05,
            fail_on_reject_ratio: false,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            offline: false,
            overwrite: OverwritePolicy::default(),
            uitf: UitfConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.max_reject_ratio) {
            return Err(ConfigError::Invalid(format!(
                "max_reject_ratio must be within 0.0..=1.0, got {}",
                self.max_reject_ratio
            )));
        }
        if self.uitf.from > self.uitf.to {
            return Err(ConfigError::Invalid(format!(
                "uitf.from ({}) is after uitf.to ({})",
                self.uitf.from, self.uitf.to
            )));
        }
        if self.uitf.timeout_secs == 0 {
            return Err(ConfigError::Invalid("uitf.timeout_secs must be positive".into()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        Ok(())
    }
}
