//! # Image Index
//!
//! Filesystem-backed lookup of captured images. There is no database: the
//! directory tree *is* the index.
//!
//! ## Layout
//!
//! ```text
//! <root>/2023/11/14/20231114144049.jpg        full-size capture
//! <root>/2023/11/14/mini/20231114144049.jpg   reduced copy (optional)
//! ```
//!
//! Every query scans at most the directories named by the request (one day,
//! one month or one year), so a lookup stays cheap without any in-memory
//! cache. Missing directories and empty listings are "no result", never an
//! error; files whose names do not parse into a [`TimestampKey`] for the
//! directory they live in are skipped with a warning.
//!
//! ## Maintenance
//!
//! The capture process uploads files with a temporary name prefix that a
//! separate job strips later. [`ImageIndex::rename_unprocessed_files`] does the
//! same for today's directory so fresh images are visible immediately. It is
//! idempotent and safe to call on every request.

use crate::timestamp::{day_dir, hour_prefix, month_dir, year_dir, IMAGE_EXTENSION};
use crate::{SizeVariant, StoredImage, TimestampKey};
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Read-only view of the archive tree as of `today`.
#[derive(Clone, Debug)]
pub struct ImageIndex {
    root: PathBuf,
    variant_dir: String,
    today: NaiveDate,
}

impl ImageIndex {
    pub fn new(root: impl Into<PathBuf>, variant_dir: impl Into<String>, today: NaiveDate) -> Self {
        ImageIndex {
            root: root.into(),
            variant_dir: variant_dir.into(),
            today,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Parse a key from an image path; see [`TimestampKey::from_path`].
    pub fn parse_timestamp_key<P: AsRef<Path>>(
        path: P,
    ) -> Result<TimestampKey, crate::timestamp::KeyError> {
        TimestampKey::from_path(path)
    }

    /// Latest image of today, else of this month, else of this year.
    ///
    /// The search stops at the first directory level that exists, even if it
    /// holds no images.
    pub fn find_latest_image(&self) -> Option<TimestampKey> {
        let today = self.today;
        let levels = [
            (day_dir(today), 0),
            (month_dir(today.year(), today.month()), 1),
            (year_dir(today.year()), 2),
        ];
        let (dir, depth) = levels
            .into_iter()
            .find(|(dir, _)| self.root.join(dir).is_dir())?;
        debug!(dir = %dir.display(), "finding latest image");

        let latest = self.keys_below(&dir, depth).into_iter().max();
        debug!(latest = ?latest.map(|k| k.to_string()), "latest image");
        latest
    }

    /// Earliest day directory under `year/month`.
    pub fn find_first_day_with_images(&self, year: i32, month: u32) -> Option<NaiveDate> {
        let first = self.days_in_month(year, month).into_iter().next();
        trace!(year, month, first = ?first, "first day with images");
        first
    }

    /// Every valid day directory under `year/month`, ascending.
    pub fn days_in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self
            .subdirs(&month_dir(year, month))
            .iter()
            .filter_map(|name| name.parse::<u32>().ok())
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .collect();
        days.sort_unstable();
        days
    }

    /// Every four-digit year directory under the root, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .subdirs(Path::new(""))
            .iter()
            .filter(|name| name.len() == 4)
            .filter_map(|name| name.parse().ok())
            .collect();
        years.sort_unstable();
        years
    }

    /// Every valid month directory under `year`, ascending.
    pub fn months_in_year(&self, year: i32) -> Vec<u32> {
        let mut months: Vec<u32> = self
            .subdirs(&year_dir(year))
            .iter()
            .filter_map(|name| name.parse().ok())
            .filter(|month| (1..=12).contains(month))
            .collect();
        months.sort_unstable();
        months
    }

    /// All full-size images of `date`, oldest first.
    pub fn list_images(&self, date: NaiveDate) -> Vec<StoredImage> {
        let images: Vec<StoredImage> = self
            .day_keys(date, "")
            .into_iter()
            .map(StoredImage::full)
            .collect();
        debug!(%date, count = images.len(), "listed images");
        images
    }

    /// Earliest image of `date` taken at or after `hour:minute:second`.
    ///
    /// Only the requested hour is scanned: an image later the same day but in
    /// a following hour is not found.
    pub fn find_first_image_at_or_after(
        &self,
        date: NaiveDate,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<TimestampKey> {
        let from = NaiveTime::from_hms_opt(hour, minute, second)?;
        let found = self
            .day_keys(date, &hour_prefix(date, hour))
            .into_iter()
            .find(|key| key.time() >= from);
        debug!(%date, %from, found = ?found.map(|k| k.to_string()), "first image at or after");
        found
    }

    /// First image of `date` taken during `hour`.
    ///
    /// Used to sample one image per day at a fixed hour in month and year
    /// overviews.
    pub fn find_latest_in_hour(&self, date: NaiveDate, hour: u32) -> Option<TimestampKey> {
        self.day_keys(date, &hour_prefix(date, hour))
            .into_iter()
            .next()
    }

    /// Images immediately before and after `key` on `date`.
    ///
    /// If `key` itself is not on disk the nearest images on either side are
    /// returned.
    pub fn find_siblings(
        &self,
        date: NaiveDate,
        key: TimestampKey,
    ) -> (Option<TimestampKey>, Option<TimestampKey>) {
        let keys = self.day_keys(date, "");
        let (before, after) = match keys.binary_search(&key) {
            Ok(i) => (i.checked_sub(1), i + 1),
            Err(i) => (i.checked_sub(1), i),
        };
        (
            before.and_then(|i| keys.get(i).copied()),
            keys.get(after).copied(),
        )
    }

    /// True if the full-size image for `key` exists.
    pub fn contains(&self, key: TimestampKey) -> bool {
        self.root.join(StoredImage::full(key).path).is_file()
    }

    /// Image for `key` in the preferred size.
    ///
    /// A reduced copy is used only if it exists on disk; otherwise the
    /// full-size image is returned.
    pub fn resolve(&self, key: TimestampKey, size: SizeVariant) -> StoredImage {
        match size {
            SizeVariant::Mini => {
                let mini = StoredImage::mini(key, &self.variant_dir);
                if self.root.join(&mini.path).is_file() {
                    mini
                } else {
                    StoredImage::full(key)
                }
            }
            SizeVariant::Full => StoredImage::full(key),
        }
    }

    /// Reduced copy of `key`, if one exists.
    pub fn variant_of(&self, key: TimestampKey) -> Option<StoredImage> {
        let mini = StoredImage::mini(key, &self.variant_dir);
        self.root.join(&mini.path).is_file().then_some(mini)
    }

    /// Strip `prefix` from every file name in today's directory that starts
    /// with it. Returns the number of files renamed.
    ///
    /// Existing targets are never overwritten. A file that disappears
    /// mid-pass is skipped; the next call picks up whatever is left.
    pub fn rename_unprocessed_files(&self, prefix: &str) -> usize {
        if prefix.is_empty() {
            return 0;
        }
        let dir = self.root.join(day_dir(self.today));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(dir = %dir.display(), "cannot scan for unprocessed files: {e}");
                return 0;
            }
        };

        let mut renamed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(stripped) = name.to_str().and_then(|n| n.strip_prefix(prefix)) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }
            let target = dir.join(stripped);
            if target.exists() {
                warn!(target = %target.display(), "rename target exists, leaving source in place");
                continue;
            }
            match fs::rename(entry.path(), &target) {
                Ok(()) => {
                    info!(from = ?name, to = stripped, "renamed unprocessed file");
                    renamed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(from = ?name, "file vanished before rename");
                }
                Err(e) => warn!(from = ?name, "rename failed: {e}"),
            }
        }
        renamed
    }

    // -- Private Implementation --

    /// Sorted keys of images in the day directory whose names start with
    /// `prefix` and belong to `date`.
    fn day_keys(&self, date: NaiveDate, prefix: &str) -> Vec<TimestampKey> {
        let mut keys: Vec<TimestampKey> = self
            .image_keys(&day_dir(date), prefix)
            .into_iter()
            .filter(|key| {
                let belongs = key.date() == date;
                if !belongs {
                    warn!(%key, %date, "image filed under the wrong day, skipping");
                }
                belongs
            })
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Keys of images exactly `depth` directories below `rel`: 0 for a day,
    /// 1 for a month, 2 for a year. Size-variant directories are not entered.
    fn keys_below(&self, rel: &Path, depth: usize) -> Vec<TimestampKey> {
        WalkDir::new(self.root.join(rel))
            .min_depth(depth + 1)
            .max_depth(depth + 1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || entry.file_name() != self.variant_dir.as_str()
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
            .filter_map(|entry| match TimestampKey::from_path(entry.path()) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(path = %entry.path().display(), "skipping image: {e}");
                    None
                }
            })
            .collect()
    }

    /// Unsorted keys of `.jpg` files directly in `rel` starting with `prefix`.
    fn image_keys(&self, rel: &Path, prefix: &str) -> Vec<TimestampKey> {
        let Ok(entries) = fs::read_dir(self.root.join(rel)) else {
            return Vec::new();
        };
        entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| is_image(path))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
            })
            .filter_map(|path| match TimestampKey::from_path(&path) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(path = %path.display(), "skipping image: {e}");
                    None
                }
            })
            .collect()
    }

    /// Names of subdirectories of `rel`, excluding the size-variant directory.
    fn subdirs(&self, rel: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.root.join(rel)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| *name != self.variant_dir)
            .collect();
        names.sort_unstable();
        names
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION))
}
