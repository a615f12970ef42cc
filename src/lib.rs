//! # Webcam Archive Core Library
//!
//! This library decides what a time-lapse webcam archive should show for a
//! requested view. Images are captured at fixed intervals by an unattended
//! camera and stored on disk by capture date; no database is involved.
//!
//! ## Design Philosophy
//!
//! ### Filesystem as the Index
//! - **Layout**: `YYYY/MM/DD/YYYYMMDDHHMMSS.jpg`, with an optional reduced copy
//!   in a size-variant subdirectory (`YYYY/MM/DD/mini/...`)
//! - **Identity**: the 14-digit filename stem is the only source of truth for
//!   capture time; directories are used to scope scans
//! - **Read-only**: the only mutation is the idempotent rename fix-up for files
//!   the capture process has not normalized yet
//!
//! ### Daylight Window
//! Only images between dawn and dusk are displayed. The window is computed per
//! calendar date with SPA ephemeris data, except during the configured
//! midnight-sun and polar-night periods where fixed windows are used.
//!
//! ### Request Flow
//! 1. **Maintenance**: rename not-yet-normalized files in today's directory
//! 2. **Locate**: scan the day/month/year directories named by the view
//! 3. **Filter**: keep images inside the daylight window
//! 4. **Navigate**: compute previous/next/up/down views
//!
//! ## Core Types
//!
//! - [`StoredImage`]: a capture key plus its path relative to the archive root
//! - [`DaylightWindow`]: dawn, sunrise, sunset and dusk for one calendar date
//! - [`SizeVariant`]: full-size image or reduced copy

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod archive;
pub mod config;
pub mod image_index;
pub mod navigation;
pub mod retention;
pub mod solar;
pub mod timestamp;
pub mod view;

pub use timestamp::TimestampKey;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// 00:00:00 of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59 of `date`, the last instant a window may reach.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::seconds(SECONDS_PER_DAY - 1)
}

/// Which copy of an image to serve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeVariant {
    /// The original capture in the day directory
    #[default]
    Full,
    /// Reduced-resolution copy in the size-variant subdirectory
    Mini,
}

/// One captured image as found on disk.
///
/// The path is relative to the archive root, e.g.
/// `2023/11/14/20231114144049.jpg` or `2023/11/14/mini/20231114144049.jpg`.
///
/// # Example
/// ```
/// use webcam_lib::{StoredImage, TimestampKey};
///
/// let key: TimestampKey = "20231114144049".parse().unwrap();
/// let image = StoredImage::full(key);
/// assert_eq!(image.path.to_str(), Some("2023/11/14/20231114144049.jpg"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    /// Capture instant encoded in the filename
    pub key: TimestampKey,
    /// Path relative to the archive root
    pub path: PathBuf,
    /// Which copy `path` points at
    pub variant: SizeVariant,
}

impl StoredImage {
    /// The full-size image for `key`.
    pub fn full(key: TimestampKey) -> Self {
        StoredImage {
            key,
            path: key.relative_dir().join(key.file_name()),
            variant: SizeVariant::Full,
        }
    }

    /// The reduced copy for `key` stored under `variant_dir`.
    pub fn mini(key: TimestampKey, variant_dir: &str) -> Self {
        StoredImage {
            key,
            path: key.relative_dir().join(variant_dir).join(key.file_name()),
            variant: SizeVariant::Mini,
        }
    }
}

/// Display window for one calendar date.
///
/// All four instants are local wall-clock times of the site and always lie
/// within `[00:00:00, 23:59:59]` of `date`, ordered
/// `dawn <= sunrise <= sunset <= dusk`.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use webcam_lib::{end_of_day, start_of_day, DaylightWindow};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let window = DaylightWindow {
///     date,
///     sunrise: start_of_day(date),
///     sunset: end_of_day(date),
///     dawn: start_of_day(date),
///     dusk: end_of_day(date),
///     midnight_sun: false,
///     polar_night: false,
/// };
/// assert!(window.contains(date.and_hms_opt(12, 0, 0).unwrap()));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaylightWindow {
    /// Calendar date the window belongs to
    pub date: NaiveDate,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
    /// Start of the display window
    pub dawn: NaiveDateTime,
    /// End of the display window
    pub dusk: NaiveDateTime,
    /// Fixed all-day window was used
    pub midnight_sun: bool,
    /// Fixed polar-night window was used
    pub polar_night: bool,
}

impl DaylightWindow {
    /// Snap every instant into the date and restore the ordering.
    ///
    /// Dawn before midnight becomes 00:00:00, dusk after the day becomes
    /// 23:59:59. Applying this twice is the same as applying it once.
    pub fn clamped(self) -> Self {
        let (lo, hi) = (start_of_day(self.date), end_of_day(self.date));
        let sunrise = self.sunrise.clamp(lo, hi);
        let sunset = self.sunset.clamp(sunrise, hi);
        DaylightWindow {
            sunrise,
            sunset,
            dawn: self.dawn.clamp(lo, sunrise),
            dusk: self.dusk.clamp(sunset, hi),
            ..self
        }
    }

    /// True if `instant` is between dawn and dusk, inclusive.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.dawn <= instant && instant <= self.dusk
    }

    /// Widen dawn down and dusk up to whole hours, staying inside the date.
    ///
    /// Day pages use this so the sub-horizon light around dawn and dusk is
    /// shown in full hours.
    pub fn rounded_to_hours(self) -> Self {
        let dawn = self
            .dawn
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(self.dawn);
        let floor = self
            .dusk
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(self.dusk);
        let dusk = if floor == self.dusk {
            floor
        } else {
            floor + Duration::hours(1)
        };
        DaylightWindow { dawn, dusk, ..self }.clamped()
    }
}
