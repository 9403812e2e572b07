//! Dashboard configuration
//!
//! Read from `air_quality.json` in the working directory, or from the file
//! named by `AIR_QUALITY_CONFIG`. Every field has a default, so a missing file
//! is not an error. The first command-line argument overrides `data_path`.

use crate::data::CleaningPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "AIR_QUALITY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "air_quality.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Year bounds are inverted: {0} > {1}")]
    InvertedBounds(i32, i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Station CSV to load at startup.
    pub data_path: PathBuf,
    /// Window title and page heading.
    pub title: String,
    /// Cell values read as missing.
    pub null_tokens: Vec<String>,
    pub cleaning: CleaningPolicy,
    /// Slider bounds; `None` uses the year span of the cleaned data.
    pub year_bounds: Option<(i32, i32)>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("PRSA_Data_Gucheng_20130301-20170228.csv"),
            title: "Air Quality in Gucheng".to_string(),
            null_tokens: vec!["NA".to_string(), String::new()],
            cleaning: CleaningPolicy::default(),
            year_bounds: None,
        }
    }
}

impl DashboardConfig {
    /// Load from the env-var path or the default file, then apply CLI overrides.
    pub fn load(args: impl IntoIterator<Item = String>) -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(data_path) = args.into_iter().nth(1) {
            config.data_path = PathBuf::from(data_path);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Using config {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.year_bounds {
            Some((lo, hi)) if lo > hi => Err(ConfigError::InvertedBounds(lo, hi)),
            _ => Ok(()),
        }
    }
}
