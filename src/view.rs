//! View keys: what a request asks to see.
//!
//! The four kinds form a containment hierarchy, Year ⊃ Month ⊃ Day ⊃ Single.
//! Their textual form is what the command line accepts and prints:
//!
//! | kind   | text                              |
//! |--------|-----------------------------------|
//! | Single | `20231114144049`                  |
//! | Day    | `2023-11-14` or `20231114`        |
//! | Month  | `2023-11` or `202311`             |
//! | Year   | `2023`                            |

use crate::timestamp::KeyError;
use crate::TimestampKey;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewParseError {
    #[error("empty view key")]
    Empty,

    #[error("unrecognized view key {0:?}")]
    Unrecognized(String),

    #[error("invalid image key: {0}")]
    Key(#[from] KeyError),

    #[error("{0:?} is not a valid date")]
    InvalidDate(String),
}

/// One of the four view kinds, carrying only what that kind needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum ViewKey {
    Single(TimestampKey),
    Day(NaiveDate),
    /// Year and month (1-12)
    Month(i32, u32),
    Year(i32),
}

impl ViewKey {
    /// Month view, if `month` is 1-12.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(ViewKey::Month(year, month))
    }

    /// The view one level out, `None` for a year.
    pub fn parent(&self) -> Option<ViewKey> {
        match *self {
            ViewKey::Single(key) => Some(ViewKey::Day(key.date())),
            ViewKey::Day(date) => Some(ViewKey::Month(date.year(), date.month())),
            ViewKey::Month(year, _) => Some(ViewKey::Year(year)),
            ViewKey::Year(_) => None,
        }
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKey::Single(key) => write!(f, "{key}"),
            ViewKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ViewKey::Month(year, month) => write!(f, "{year:04}-{month:02}"),
            ViewKey::Year(year) => write!(f, "{year:04}"),
        }
    }
}

impl FromStr for ViewKey {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ViewParseError::Empty);
        }
        // Dashes are only allowed as the separators of YYYY-MM and YYYY-MM-DD.
        let widths: Vec<usize> = s.split('-').map(str::len).collect();
        if widths.len() > 1 && widths != [4, 2] && widths != [4, 2, 2] {
            return Err(ViewParseError::Unrecognized(s.to_string()));
        }
        let digits: String = s.chars().filter(|c| *c != '-').collect();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ViewParseError::Unrecognized(s.to_string()));
        }
        let number = |range: std::ops::Range<usize>| {
            digits[range]
                .parse::<u32>()
                .map_err(|_| ViewParseError::Unrecognized(s.to_string()))
        };

        match digits.len() {
            14 => Ok(ViewKey::Single(digits.parse()?)),
            8 => NaiveDate::from_ymd_opt(number(0..4)? as i32, number(4..6)?, number(6..8)?)
                .map(ViewKey::Day)
                .ok_or_else(|| ViewParseError::InvalidDate(s.to_string())),
            6 => ViewKey::month(number(0..4)? as i32, number(4..6)?)
                .ok_or_else(|| ViewParseError::InvalidDate(s.to_string())),
            4 => Ok(ViewKey::Year(number(0..4)? as i32)),
            _ => Err(ViewParseError::Unrecognized(s.to_string())),
        }
    }
}
