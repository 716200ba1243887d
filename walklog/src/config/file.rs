//! INI configuration file.
//!
//! ```ini
//! [tracking]
//! high_accuracy = true
//! fix_timeout_secs = 10
//! maximum_age_ms = 0
//! min_movement_m = 0
//!
//! [tiles]
//! zoom = 17
//!
//! [logging]
//! filter = info
//! file = /var/log/walklog.log
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use super::{TrackerConfig, DEFAULT_LOG_FILTER};
use crate::walk::AcceptancePolicy;

const SECTION_TRACKING: &str = "tracking";
const SECTION_TILES: &str = "tiles";
const SECTION_LOGGING: &str = "logging";

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid INI.
    #[error("Invalid config file: {0}")]
    Parse(String),

    /// A key holds a value of the wrong type or range.
    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

/// Default location of the configuration file.
///
/// `$XDG_CONFIG_HOME/walklog/config.ini` on Linux, the platform equivalent
/// elsewhere, falling back to the working directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("walklog")
        .join("config.ini")
}

/// Settings loaded from the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Tracker settings.
    pub tracker: TrackerConfig,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Optional log file.
    pub log_file: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: None,
        }
    }
}

impl ConfigFile {
    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(parse) => ConfigError::Parse(parse.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    /// Load from `path`, or from [`config_file_path`] when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = config_file_path();
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(SECTION_TRACKING)) {
            let tracker = &mut config.tracker;
            if let Some(v) = parse_bool(section, SECTION_TRACKING, "high_accuracy")? {
                tracker.watch.high_accuracy = v;
            }
            if let Some(v) = parse_value::<u64>(section, SECTION_TRACKING, "fix_timeout_secs")? {
                if v == 0 {
                    return Err(invalid(SECTION_TRACKING, "fix_timeout_secs", "0"));
                }
                tracker.watch.timeout = Duration::from_secs(v);
            }
            if let Some(v) = parse_value::<u64>(section, SECTION_TRACKING, "maximum_age_ms")? {
                tracker.watch.maximum_age = Duration::from_millis(v);
            }
            if let Some(v) = parse_value::<f64>(section, SECTION_TRACKING, "min_movement_m")? {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(SECTION_TRACKING, "min_movement_m", &v.to_string()));
                }
                tracker.acceptance = AcceptancePolicy::from_min_movement(v);
            }
        }

        if let Some(section) = ini.section(Some(SECTION_TILES)) {
            if let Some(zoom) = parse_value::<u8>(section, SECTION_TILES, "zoom")? {
                // 2^zoom tile indices must fit in an i64
                if zoom > 30 {
                    return Err(invalid(SECTION_TILES, "zoom", &zoom.to_string()));
                }
                config.tracker.tile_zoom = zoom;
            }
        }

        if let Some(section) = ini.section(Some(SECTION_LOGGING)) {
            if let Some(filter) = section.get("filter") {
                config.log_filter = filter.trim().to_string();
            }
            if let Some(file) = section.get("file") {
                let file = file.trim();
                if !file.is_empty() {
                    config.log_file = Some(PathBuf::from(file));
                }
            }
        }

        Ok(config)
    }

    /// Effective settings as `(section, key, value)` rows for display.
    pub fn entries(&self) -> Vec<(&'static str, &'static str, String)> {
        let watch = &self.tracker.watch;
        vec![
            (
                SECTION_TRACKING,
                "high_accuracy",
                watch.high_accuracy.to_string(),
            ),
            (
                SECTION_TRACKING,
                "fix_timeout_secs",
                watch.timeout.as_secs().to_string(),
            ),
            (
                SECTION_TRACKING,
                "maximum_age_ms",
                watch.maximum_age.as_millis().to_string(),
            ),
            (
                SECTION_TRACKING,
                "min_movement_m",
                self.tracker.acceptance.min_movement_m().to_string(),
            ),
            (SECTION_TILES, "zoom", self.tracker.tile_zoom.to_string()),
            (SECTION_LOGGING, "filter", self.log_filter.clone()),
            (
                SECTION_LOGGING,
                "file",
                self.log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        ]
    }
}

fn invalid(section: &'static str, key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
    }
}

fn parse_value<T: FromStr>(
    properties: &Properties,
    section: &'static str,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    properties
        .get(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|_| invalid(section, key, raw)))
        .transpose()
}

fn parse_bool(
    properties: &Properties,
    section: &'static str,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    properties
        .get(key)
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid(section, key, raw)),
        })
        .transpose()
}
