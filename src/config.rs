use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{MemoraError, Result};

/// One year
const MAX_CLEANUP_INTERVAL_MINS: u64 = 525_600;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted note record
    pub data_dir: PathBuf,

    /// Window within which rapid changes are coalesced into one write (ms)
    pub persist_debounce_ms: u64,

    /// How often to purge expired trash while running (minutes, 0 = only at startup)
    pub trash_cleanup_interval_mins: u64,

    /// Whether to create a first note when the store is empty
    pub seed_initial_note: bool,

    /// Size of the desktop area, used to centre the first note
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            persist_debounce_ms: 250,
            trash_cleanup_interval_mins: 60,
            seed_initial_note: true,
            viewport_width: 1280.0,
            viewport_height: 800.0,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "memora")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".memora"))
}

impl Config {
    /// Platform location of `config.json`
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads the config at `path`, or the platform default location.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => {
                    debug!("No platform config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| MemoraError::ConfigError {
            message: format!("Invalid config file {}: {}", path.display(), e),
        })?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| MemoraError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return Err(MemoraError::ConfigError {
                message: "viewport dimensions must be positive".to_string(),
            });
        }
        if self.trash_cleanup_interval_mins > MAX_CLEANUP_INTERVAL_MINS {
            return Err(MemoraError::ConfigError {
                message: format!(
                    "trash cleanup interval must be at most {} minutes",
                    MAX_CLEANUP_INTERVAL_MINS
                ),
            });
        }
        Ok(())
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn trash_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.trash_cleanup_interval_mins.saturating_mul(60))
    }

    /// Where the first note goes: centred in the viewport
    pub fn seed_position(&self) -> Option<(f64, f64)> {
        self.seed_initial_note.then(|| {
            (
                self.viewport_width / 2.0 - 160.0,
                self.viewport_height / 2.0 - 150.0,
            )
        })
    }
}
