//! Configuration file handling for drizzle.
//!
//! The configuration lives in `<config_dir>/drizzle/config.toml`. A missing
//! file yields the defaults; a malformed one is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use drizzle_core::Settings;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Errors from loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Terminal application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Redraw period in milliseconds.
    pub frame_rate_ms: u64,
    /// Log filter used when `DRIZZLE_LOG` is not set. Logging is off when
    /// neither is given.
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_rate_ms: 33,
            log_level: None,
        }
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub emitter: Settings,
    pub app: AppConfig,
}

impl Config {
    /// Platform default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "drizzle").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, contents).map_err(write_err)?;
        debug!("saved config to {}", path.display());
        Ok(())
    }
}
