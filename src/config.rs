//! Dashboard configuration, read from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::indicators::{DEFAULT_DISEASES, DEFAULT_DRIVERS};
use crate::data::loader::LoadOptions;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Cleaned dataset loaded at start-up
    pub data_path: PathBuf,

    /// ADM1 region boundaries for the map
    pub geojson_path: PathBuf,

    /// `sha256sum`-style manifest of the published files
    pub checksum_manifest: PathBuf,

    pub date_column: String,
    pub region_column: String,

    /// GeoJSON feature property holding the region name
    pub boundary_name_property: String,

    /// Columns offered in the disease selector
    pub disease_columns: Vec<String>,

    /// Columns offered in the correlation selector
    pub driver_columns: Vec<String>,

    pub window_width: f32,
    pub window_height: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("ghana_infectious_disease_model_dataset_cleaned.csv"),
            geojson_path: PathBuf::from("geoBoundaries-GHA-ADM1_simplified.geojson"),
            checksum_manifest: PathBuf::from("SHA256SUMS"),
            date_column: "date".into(),
            region_column: "region".into(),
            boundary_name_property: "shapeName".into(),
            disease_columns: DEFAULT_DISEASES.iter().map(|s| s.to_string()).collect(),
            driver_columns: DEFAULT_DRIVERS.iter().map(|s| s.to_string()).collect(),
            window_width: 1280.0,
            window_height: 900.0,
        }
    }
}

impl DashboardConfig {
    /// Load config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Use `explicit` if given, else `dashboard.toml` when it exists, else
    /// defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_column: self.date_column.clone(),
            region_column: self.region_column.clone(),
        }
    }
}
