//! # Timestamp Keys
//!
//! Every image filename carries its capture instant as a 14-digit
//! `YYYYMMDDHHMMSS` stem. This module turns paths into [`TimestampKey`]s and
//! back into the directory layout.
//!
//! Parsing keeps the digits of the file stem and ignores everything else, so
//! `2023/11/14/20231114144049.jpg` and `cam_20231114144049 (1).jpg` both yield
//! `20231114144049`. Unlike a blind substring, the digits must form a real
//! calendar date and time of day; anything shorter than 14 digits or naming an
//! impossible instant is rejected with a [`KeyError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Number of digits in a key.
pub const KEY_LEN: usize = 14;

/// Extension of stored images.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Errors produced while turning a filename into a key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Path has no file name component
    #[error("no file name in {0:?}")]
    NoFileName(String),

    /// Stem holds fewer than 14 digits
    #[error("expected 14 digits in {stem:?}, found {found}")]
    TooFewDigits { stem: String, found: usize },

    /// Digits do not name a real calendar instant
    #[error("{0} is not a valid capture time")]
    InvalidInstant(String),
}

/// Capture instant of one image, identical to its filename stem.
///
/// Ordering is chronological, and because every key renders to exactly 14
/// zero-padded digits it is also the lexicographic ordering of the filenames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimestampKey(NaiveDateTime);

impl TimestampKey {
    /// Parse the key from any path whose file stem contains the 14 digits.
    ///
    /// Directory components and the extension are ignored. Non-digit
    /// characters in the stem are dropped; digits beyond the first 14 are
    /// ignored.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .ok_or_else(|| KeyError::NoFileName(path.display().to_string()))?
            .to_string_lossy();
        let digits: String = stem.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < KEY_LEN {
            return Err(KeyError::TooFewDigits {
                stem: stem.into_owned(),
                found: digits.len(),
            });
        }
        Self::from_digits(&digits[..KEY_LEN])
    }

    fn from_digits(digits: &str) -> Result<Self, KeyError> {
        let invalid = || KeyError::InvalidInstant(digits.to_string());
        let field = |range: Range<usize>| {
            digits
                .get(range)
                .and_then(|s| s.parse::<u32>().ok())
                .ok_or_else(invalid)
        };

        let date = NaiveDate::from_ymd_opt(field(0..4)? as i32, field(4..6)?, field(6..8)?)
            .ok_or_else(invalid)?;
        let time = NaiveTime::from_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)
            .ok_or_else(invalid)?;
        Ok(TimestampKey(date.and_time(time)))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    /// `YYYY/MM/DD`, the directory the image lives in.
    pub fn relative_dir(&self) -> PathBuf {
        day_dir(self.date())
    }

    /// `YYYYMMDDHHMMSS.jpg`
    pub fn file_name(&self) -> String {
        format!("{self}.{IMAGE_EXTENSION}")
    }
}

/// `YYYY/MM/DD` relative directory for a date.
pub fn day_dir(date: NaiveDate) -> PathBuf {
    month_dir(date.year(), date.month()).join(format!("{:02}", date.day()))
}

/// `YYYY/MM` relative directory.
pub fn month_dir(year: i32, month: u32) -> PathBuf {
    year_dir(year).join(format!("{month:02}"))
}

/// `YYYY` relative directory.
pub fn year_dir(year: i32) -> PathBuf {
    PathBuf::from(format!("{year:04}"))
}

/// Filename prefix shared by every capture of `date` during `hour`.
pub fn hour_prefix(date: NaiveDate, hour: u32) -> String {
    format!("{}{hour:02}", date.format("%Y%m%d"))
}

impl fmt::Display for TimestampKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d%H%M%S"))
    }
}

impl FromStr for TimestampKey {
    type Err = KeyError;

    /// Strict form used for request input: exactly 14 digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != KEY_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::TooFewDigits {
                stem: s.to_string(),
                found: s.chars().filter(char::is_ascii_digit).count(),
            });
        }
        Self::from_digits(s)
    }
}

impl From<TimestampKey> for String {
    fn from(key: TimestampKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for TimestampKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
