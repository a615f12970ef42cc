//! # Archive Retention
//!
//! Frees disk space in old parts of the archive by removing images that are
//! never displayed. Pruning is split in two steps so the default is harmless:
//!
//! 1. [`plan_retention`] scans the archive and lists what would be deleted
//! 2. [`apply_plan`] deletes the listed files
//!
//! An image is planned for deletion when it was taken outside the daylight
//! window of its day. With `one_per_hour`, only the image closest to each
//! whole hour survives inside the window. Reduced copies follow their
//! full-size image.

use crate::archive::Archive;
use crate::solar::Ephemeris;
use crate::StoredImage;
use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("month filter must look like YYYY/MM, got {0:?}")]
    InvalidMonth(String),

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which part of the archive to prune and how aggressively.
#[derive(Clone, Debug)]
pub struct RetentionOptions {
    /// Only years at least this old are considered
    pub min_age_years: i32,
    /// Restrict the scan to one `(year, month)`, regardless of age
    pub month: Option<(i32, u32)>,
    /// Keep a single image per hour inside the daylight window
    pub one_per_hour: bool,
}

impl Default for RetentionOptions {
    fn default() -> Self {
        RetentionOptions {
            min_age_years: 5,
            month: None,
            one_per_hour: false,
        }
    }
}

/// Files selected for deletion. Paths are relative to the archive root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RetentionPlan {
    pub days_scanned: usize,
    pub images_scanned: usize,
    pub delete: Vec<PathBuf>,
    /// Combined size of the planned files
    pub bytes: u64,
}

/// Parse a `YYYY/MM` month filter.
pub fn parse_month_filter(text: &str) -> Result<(i32, u32), RetentionError> {
    let invalid = || RetentionError::InvalidMonth(text.to_string());
    let (year, month) = text.split_once('/').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Work out which images can go. Nothing is touched on disk.
pub fn plan_retention<E: Ephemeris>(archive: &Archive<E>, options: &RetentionOptions) -> RetentionPlan {
    let index = archive.index();
    let mut plan = RetentionPlan::default();

    for date in candidate_days(archive, options) {
        let window = archive.daylight_window(date);
        let images = index.list_images(date);
        plan.days_scanned += 1;
        plan.images_scanned += images.len();

        let mut by_hour: BTreeMap<u32, Vec<_>> = BTreeMap::new();
        let mut doomed = Vec::new();
        for image in images {
            if window.contains(image.key.datetime()) {
                by_hour.entry(image.key.time().hour()).or_default().push(image.key);
            } else {
                doomed.push(image.key);
            }
        }
        if options.one_per_hour {
            // Keys within an hour are ascending, so the first is closest to HH:00.
            doomed.extend(by_hour.into_values().flat_map(|keys| keys.into_iter().skip(1)));
        }

        debug!(%date, doomed = doomed.len(), "planned day");
        for key in doomed {
            plan.delete.push(StoredImage::full(key).path);
            if let Some(mini) = index.variant_of(key) {
                plan.delete.push(mini.path);
            }
        }
    }

    plan.delete.sort();
    plan.bytes = plan
        .delete
        .iter()
        .filter_map(|rel| fs::metadata(index.root().join(rel)).ok())
        .map(|meta| meta.len())
        .sum();
    info!(
        days = plan.days_scanned,
        images = plan.images_scanned,
        files = plan.delete.len(),
        bytes = plan.bytes,
        "retention plan ready"
    );
    plan
}

/// Delete every file in `plan`. Files already gone are skipped.
///
/// Returns the number of files removed.
pub fn apply_plan(root: &Path, plan: &RetentionPlan) -> Result<usize, RetentionError> {
    let mut removed = 0;
    for rel in &plan.delete {
        let path = root.join(rel);
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "already deleted");
            }
            Err(source) => return Err(RetentionError::Delete { path, source }),
        }
    }
    info!(removed, "applied retention plan");
    Ok(removed)
}

fn candidate_days<E: Ephemeris>(archive: &Archive<E>, options: &RetentionOptions) -> Vec<NaiveDate> {
    let index = archive.index();
    if let Some((year, month)) = options.month {
        return index.days_in_month(year, month);
    }
    let newest_year = archive.now().year() - options.min_age_years;
    index
        .years()
        .into_iter()
        .filter(|year| *year <= newest_year)
        .flat_map(|year| {
            index
                .months_in_year(year)
                .into_iter()
                .flat_map(move |month| index.days_in_month(year, month))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::solar::{SolarWindowCalculator, SunEvents};
    use crate::start_of_day;
    use chrono::Duration;
    use tempfile::TempDir;

    /// Dawn 06:30, sunrise 08:00, sunset 15:00, dusk 16:30.
    struct FixedEphemeris;

    impl Ephemeris for FixedEphemeris {
        fn sun_events(&self, date: NaiveDate, _: f64, _: f64) -> SunEvents {
            let midnight = start_of_day(date);
            SunEvents {
                sunrise: Some(midnight + Duration::hours(8)),
                sunset: Some(midnight + Duration::hours(15)),
                twilight_begin: Some(midnight + Duration::minutes(6 * 60 + 30)),
                twilight_end: Some(midnight + Duration::minutes(16 * 60 + 30)),
            }
        }
    }

    const FILES: &[&str] = &[
        "2018/03/10/20180310050000.jpg",
        "2018/03/10/20180310070000.jpg",
        "2018/03/10/20180310071500.jpg",
        "2018/03/10/20180310073000.jpg",
        "2018/03/10/mini/20180310073000.jpg",
        "2018/03/10/20180310170000.jpg",
        "2018/03/10/mini/20180310170000.jpg",
        "2023/03/10/20230310050000.jpg",
    ];

    fn archive(dir: &TempDir) -> Archive<FixedEphemeris> {
        for file in FILES {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"jpeg").unwrap();
        }
        let mut config = Config::default();
        config.site.archive_root = dir.path().to_path_buf();
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let solar = SolarWindowCalculator::new(config.seasons.clone(), FixedEphemeris);
        Archive::with_calculator(config, now, solar)
    }

    fn paths(plan: &RetentionPlan) -> Vec<&str> {
        plan.delete.iter().map(|p| p.to_str().unwrap()).collect()
    }

    #[test]
    fn test_plans_images_outside_window_for_old_years() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        let plan = plan_retention(&archive, &RetentionOptions::default());
        assert_eq!(plan.days_scanned, 1);
        assert_eq!(plan.images_scanned, 5);
        assert_eq!(
            paths(&plan),
            vec![
                "2018/03/10/20180310050000.jpg",
                "2018/03/10/20180310170000.jpg",
                "2018/03/10/mini/20180310170000.jpg",
            ]
        );
        assert_eq!(plan.bytes, 12);
    }

    #[test]
    fn test_one_per_hour_keeps_image_closest_to_the_hour() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        let options = RetentionOptions {
            one_per_hour: true,
            ..RetentionOptions::default()
        };
        let plan = plan_retention(&archive, &options);
        assert_eq!(
            paths(&plan),
            vec![
                "2018/03/10/20180310050000.jpg",
                "2018/03/10/20180310071500.jpg",
                "2018/03/10/20180310073000.jpg",
                "2018/03/10/20180310170000.jpg",
                "2018/03/10/mini/20180310073000.jpg",
                "2018/03/10/mini/20180310170000.jpg",
            ]
        );
    }

    #[test]
    fn test_month_filter_ignores_age() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        let options = RetentionOptions {
            month: Some((2023, 3)),
            ..RetentionOptions::default()
        };
        let plan = plan_retention(&archive, &options);
        assert_eq!(paths(&plan), vec!["2023/03/10/20230310050000.jpg"]);

        let nothing_old = RetentionOptions {
            min_age_years: 10,
            ..RetentionOptions::default()
        };
        assert_eq!(plan_retention(&archive, &nothing_old).days_scanned, 0);
    }

    #[test]
    fn test_apply_deletes_and_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        let plan = plan_retention(&archive, &RetentionOptions::default());

        assert_eq!(apply_plan(dir.path(), &plan).unwrap(), 3);
        assert!(!dir.path().join("2018/03/10/20180310050000.jpg").exists());
        assert!(dir.path().join("2018/03/10/20180310070000.jpg").exists());
        assert_eq!(apply_plan(dir.path(), &plan).unwrap(), 0);

        let replanned = plan_retention(&archive, &RetentionOptions::default());
        assert!(replanned.delete.is_empty());
    }

    #[test]
    fn test_parse_month_filter() {
        assert_eq!(parse_month_filter("2018/03").unwrap(), (2018, 3));
        for bad in ["2018-03", "2018/3", "2018/13", "18/03", "2018/ab", ""] {
            assert!(
                matches!(parse_month_filter(bad), Err(RetentionError::InvalidMonth(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
