//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! webcam-config.toml file. It holds everything that is specific to one camera
//! installation: site coordinates and timezone, the midnight-sun and
//! polar-night periods, display sampling, and the filename prefixes written by
//! the capture process.
//!
//! The configuration is loaded once and passed by reference to every
//! component; nothing mutates it afterwards.

use crate::solar::Twilight;
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "webcam-config.toml";

/// Errors while reading or writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config file format: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from webcam-config.toml
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Camera location and archive root
    pub site: SiteConfig,
    /// Midnight sun, polar night and twilight settings
    pub seasons: SeasonConfig,
    /// Overview sampling and limits
    pub display: DisplayConfig,
    /// Upstream capture process settings
    pub capture: CaptureConfig,
}

/// Camera location
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Human-readable site name for reference
    pub name: String,
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
    /// IANA timezone the camera clock and filenames use
    pub timezone: Tz,
    /// Directory holding the `YYYY/MM/DD` tree
    pub archive_root: PathBuf,
}

/// A calendar day without a year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        MonthDay { month, day }
    }

    pub fn of(date: NaiveDate) -> Self {
        MonthDay::new(date.month(), date.day())
    }
}

/// Inclusive range of calendar days that repeats every year.
///
/// A range whose end comes before its start wraps over New Year, e.g.
/// December 6 to January 6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeasonRange {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl SeasonRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        let day = MonthDay::of(date);
        if self.start <= self.end {
            self.start <= day && day <= self.end
        } else {
            day >= self.start || day <= self.end
        }
    }
}

/// Fixed-window periods and twilight settings.
///
/// The periods are tied to the configured site; they are not derived from
/// the coordinates.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeasonConfig {
    /// Days when the sun does not set
    pub midnight_sun: SeasonRange,
    /// Days when the sun does not rise
    pub polar_night: SeasonRange,
    /// Fake sunrise hour during polar night
    pub polar_night_sunrise_hour: u32,
    /// Fake sunset hour during polar night
    pub polar_night_sunset_hour: u32,
    /// Hours between dawn and sunrise (and sunset and dusk) when no twilight
    /// time is available
    pub dawn_dusk_adjust_hours: u32,
    /// Twilight definition used for dawn and dusk
    pub twilight: Twilight,
}

/// Overview and listing configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Day of month whose window represents the whole month
    pub monthly_day: u32,
    /// Hour sampled for each day in month and year overviews
    pub monthly_hour: u32,
    /// Maximum images listed for one day
    pub max_images: usize,
    /// Subdirectory of a day holding the reduced copies
    pub variant_dir: String,
}

/// Capture process configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Prefixes the camera writes before files are normalized
    pub rename_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            site: SiteConfig {
                name: "Lillevik Lofoten".to_string(),
                latitude: 68.330_081_4,
                longitude: 14.091_752_9,
                timezone: Tz::Europe__Oslo,
                archive_root: PathBuf::from("."),
            },
            seasons: SeasonConfig {
                midnight_sun: SeasonRange {
                    start: MonthDay::new(5, 24),
                    end: MonthDay::new(7, 18),
                },
                polar_night: SeasonRange {
                    start: MonthDay::new(12, 6),
                    end: MonthDay::new(1, 6),
                },
                polar_night_sunrise_hour: 8,
                polar_night_sunset_hour: 15,
                dawn_dusk_adjust_hours: 2,
                twilight: Twilight::Nautical,
            },
            display: DisplayConfig {
                monthly_day: 15,
                monthly_hour: 12,
                max_images: 1000,
                variant_dir: "mini".to_string(),
            },
            capture: CaptureConfig {
                rename_prefixes: vec!["Lillevik Lofoten_01_".to_string()],
            },
        }
    }
}

impl Config {
    /// Load configuration from webcam-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!(site = %config.site.name, "loaded configuration");
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    path = %path.as_ref().display(),
                    "no config file found, using default configuration"
                );
                Self::default()
            }
            Err(e) => {
                warn!(
                    path = %path.as_ref().display(),
                    "{e}; using default configuration"
                );
                Self::default()
            }
        }
    }

    /// Load configuration, surfacing IO and format errors
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
