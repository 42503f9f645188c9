// Console configuration loaded from YAML

use crate::export::{DEFAULT_FILE_NAME, DateTimeFormats};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://diabetesbackend.onrender.com/api/consultations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Collection endpoint; deletes go to `{endpoint}/{id}`
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Where exports are written
    pub output: PathBuf,
    /// chrono format for the export date column
    pub date_format: String,
    /// chrono format for the export time column
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        let formats = DateTimeFormats::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            output: PathBuf::from(DEFAULT_FILE_NAME),
            date_format: formats.date,
            time_format: formats.time,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/consultations/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("consultations").join("config.yaml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))?;

        debug!(path = ?path, endpoint = %config.endpoint, "Loaded config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn formats(&self) -> DateTimeFormats {
        DateTimeFormats {
            date: self.date_format.clone(),
            time: self.time_format.clone(),
        }
    }
}
