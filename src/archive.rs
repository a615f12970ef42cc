//! # Archive Requests
//!
//! Ties the configuration, the image index and the solar calculator together
//! for one request. An [`Archive`] is a snapshot: it captures "now" once when
//! it is opened and reads the filesystem on demand, keeping nothing between
//! requests.
//!
//! ## Request Pipeline
//! 1. **Open**: capture the current local time in the site timezone
//! 2. **Maintain**: strip capture prefixes from today's new files
//! 3. **Collect**: gather the images the view should show
//! 4. **Navigate**: compute previous/next/up/down links
//!
//! ## What Each View Shows
//! - **Single**: the image itself, if it exists
//! - **Day**: images between dawn and dusk (widened to whole hours), newest
//!   first, at most `max_images`
//! - **Month**: one image per day, taken during `monthly_hour`
//! - **Year**: one image per month, from `monthly_day` during `monthly_hour`
//!
//! An empty image list means "no photos to display for this period".

use crate::config::Config;
use crate::image_index::ImageIndex;
use crate::navigation::{NavigationCalculator, NavigationLinks};
use crate::solar::{Ephemeris, SolarWindowCalculator, SpaEphemeris};
use crate::view::ViewKey;
use crate::{DaylightWindow, SizeVariant, StoredImage};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Everything a renderer needs for one view.
#[derive(Clone, Debug, Serialize)]
pub struct ViewContents {
    pub view: ViewKey,
    /// Daylight window the images were filtered with, if the view has one
    pub window: Option<DaylightWindow>,
    pub images: Vec<StoredImage>,
    pub links: NavigationLinks,
}

/// One request's view of the webcam archive.
pub struct Archive<E = SpaEphemeris> {
    config: Config,
    index: ImageIndex,
    solar: SolarWindowCalculator<E>,
    now: NaiveDateTime,
}

impl Archive<SpaEphemeris> {
    /// Open the archive as of the current wall-clock time at the site.
    pub fn open_now(config: Config) -> Self {
        let now = Utc::now()
            .with_timezone(&config.site.timezone)
            .naive_local();
        Self::open(config, now)
    }

    /// Open the archive as of `now`, a site-local time.
    pub fn open(config: Config, now: NaiveDateTime) -> Self {
        let solar = SolarWindowCalculator::spa(config.seasons.clone(), config.site.timezone);
        Self::with_calculator(config, now, solar)
    }
}

impl<E: Ephemeris> Archive<E> {
    pub fn with_calculator(config: Config, now: NaiveDateTime, solar: SolarWindowCalculator<E>) -> Self {
        let index = ImageIndex::new(
            config.site.archive_root.clone(),
            config.display.variant_dir.clone(),
            now.date(),
        );
        debug!(root = %index.root().display(), %now, "opened archive");
        Archive {
            config,
            index,
            solar,
            now,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &ImageIndex {
        &self.index
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn navigation(&self) -> NavigationCalculator<'_, E> {
        NavigationCalculator::new(&self.index, &self.solar, &self.config.site, self.now.date())
    }

    /// Daylight window for `date` at the configured site.
    pub fn daylight_window(&self, date: NaiveDate) -> DaylightWindow {
        self.solar
            .compute_window(date, self.config.site.latitude, self.config.site.longitude)
    }

    /// Rename files the capture process has not normalized yet.
    ///
    /// Run once per request before any read. Returns the number of files
    /// renamed.
    pub fn run_maintenance(&self) -> usize {
        let renamed = self
            .config
            .capture
            .rename_prefixes
            .iter()
            .map(|prefix| self.index.rename_unprocessed_files(prefix))
            .sum();
        if renamed > 0 {
            info!(renamed, "normalized new captures");
        }
        renamed
    }

    /// Single view of the newest image, searching today, this month and
    /// this year in that order.
    pub fn latest(&self) -> Option<ViewKey> {
        self.index.find_latest_image().map(ViewKey::Single)
    }

    pub fn links(&self, view: &ViewKey) -> NavigationLinks {
        self.navigation().compute_links(view)
    }

    /// Images, window and links for `view`.
    pub fn view(&self, view: &ViewKey, size: SizeVariant) -> ViewContents {
        let (window, images) = match *view {
            ViewKey::Single(key) => {
                let images = if self.index.contains(key) {
                    vec![self.index.resolve(key, size)]
                } else {
                    Vec::new()
                };
                (Some(self.daylight_window(key.date())), images)
            }
            ViewKey::Day(date) => {
                let window = self.daylight_window(date).rounded_to_hours();
                (Some(window), self.day_images(date, &window, size))
            }
            ViewKey::Month(year, month) => {
                let window = NaiveDate::from_ymd_opt(year, month, self.config.display.monthly_day)
                    .map(|date| self.daylight_window(date));
                (window, self.month_images(year, month, size))
            }
            ViewKey::Year(year) => (None, self.year_images(year, size)),
        };
        debug!(%view, count = images.len(), "collected view images");

        ViewContents {
            view: *view,
            window,
            images,
            links: self.links(view),
        }
    }

    fn day_images(&self, date: NaiveDate, window: &DaylightWindow, size: SizeVariant) -> Vec<StoredImage> {
        self.index
            .list_images(date)
            .into_iter()
            .rev()
            .filter(|image| window.contains(image.key.datetime()))
            .take(self.config.display.max_images)
            .map(|image| self.index.resolve(image.key, size))
            .collect()
    }

    fn month_images(&self, year: i32, month: u32, size: SizeVariant) -> Vec<StoredImage> {
        let hour = self.config.display.monthly_hour;
        self.index
            .days_in_month(year, month)
            .into_iter()
            .filter_map(|date| self.index.find_latest_in_hour(date, hour))
            .map(|key| self.index.resolve(key, size))
            .collect()
    }

    fn year_images(&self, year: i32, size: SizeVariant) -> Vec<StoredImage> {
        let display = &self.config.display;
        (1..=12)
            .filter_map(|month| NaiveDate::from_ymd_opt(year, month, display.monthly_day))
            .filter_map(|date| self.index.find_latest_in_hour(date, display.monthly_hour))
            .map(|key| self.index.resolve(key, size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::SunEvents;
    use crate::{start_of_day, TimestampKey};
    use chrono::Duration;
    use std::fs;
    use std::path::Path;
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

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"jpeg").unwrap();
    }

    fn key(s: &str) -> TimestampKey {
        s.parse().unwrap()
    }

    fn archive(dir: &TempDir, files: &[&str], now: &str) -> Archive<FixedEphemeris> {
        for file in files {
            touch(dir.path(), file);
        }
        let mut config = Config::default();
        config.site.archive_root = dir.path().to_path_buf();
        let now = key(now).datetime();
        let solar = SolarWindowCalculator::new(config.seasons.clone(), FixedEphemeris);
        Archive::with_calculator(config, now, solar)
    }

    fn keys(images: &[StoredImage]) -> Vec<String> {
        images.iter().map(|i| i.key.to_string()).collect()
    }

    #[test]
    fn test_day_view_filters_to_rounded_window_newest_first() {
        let dir = TempDir::new().unwrap();
        let archive = archive(
            &dir,
            &[
                "2023/11/14/20231114055900.jpg",
                "2023/11/14/20231114060000.jpg",
                "2023/11/14/20231114120000.jpg",
                "2023/11/14/20231114165900.jpg",
                "2023/11/14/20231114170000.jpg",
                "2023/11/14/20231114170001.jpg",
            ],
            "20231120120000",
        );
        let contents = archive.view(&ViewKey::Day(key("20231114000000").date()), SizeVariant::Full);
        // Window 06:30-16:30 widened to 06:00-17:00.
        assert_eq!(
            keys(&contents.images),
            vec!["20231114170000", "20231114165900", "20231114120000", "20231114060000"]
        );
        assert!(contents.window.is_some());
        assert_eq!(contents.links.up, Some(ViewKey::Month(2023, 11)));
    }

    #[test]
    fn test_day_view_respects_max_images_and_size() {
        let dir = TempDir::new().unwrap();
        let mut archive = archive(
            &dir,
            &[
                "2023/11/14/20231114100000.jpg",
                "2023/11/14/20231114110000.jpg",
                "2023/11/14/mini/20231114110000.jpg",
                "2023/11/14/20231114120000.jpg",
            ],
            "20231120120000",
        );
        archive.config.display.max_images = 2;
        let contents = archive.view(&ViewKey::Day(key("20231114000000").date()), SizeVariant::Mini);
        assert_eq!(keys(&contents.images), vec!["20231114120000", "20231114110000"]);
        assert_eq!(contents.images[0].variant, SizeVariant::Full);
        assert_eq!(contents.images[1].variant, SizeVariant::Mini);
    }

    #[test]
    fn test_single_view() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir, &["2023/11/14/20231114120000.jpg"], "20231120120000");

        let found = archive.view(&ViewKey::Single(key("20231114120000")), SizeVariant::Full);
        assert_eq!(keys(&found.images), vec!["20231114120000"]);
        assert_eq!(found.links.up, Some(ViewKey::Day(key("20231114120000").date())));

        let missing = archive.view(&ViewKey::Single(key("20231114130000")), SizeVariant::Full);
        assert!(missing.images.is_empty());
    }

    #[test]
    fn test_month_view_samples_monthly_hour() {
        let dir = TempDir::new().unwrap();
        let archive = archive(
            &dir,
            &[
                "2023/11/01/20231101115900.jpg",
                "2023/11/01/20231101120500.jpg",
                "2023/11/02/20231102130000.jpg",
                "2023/11/03/20231103120000.jpg",
            ],
            "20231120120000",
        );
        let contents = archive.view(&ViewKey::Month(2023, 11), SizeVariant::Full);
        assert_eq!(keys(&contents.images), vec!["20231101120500", "20231103120000"]);
        assert_eq!(
            contents.window.map(|w| w.date),
            NaiveDate::from_ymd_opt(2023, 11, 15)
        );
    }

    #[test]
    fn test_year_view_samples_monthly_day() {
        let dir = TempDir::new().unwrap();
        let archive = archive(
            &dir,
            &[
                "2023/03/15/20230315121000.jpg",
                "2023/03/16/20230316120000.jpg",
                "2023/10/15/20231015120000.jpg",
            ],
            "20231120120000",
        );
        let contents = archive.view(&ViewKey::Year(2023), SizeVariant::Full);
        assert_eq!(keys(&contents.images), vec!["20230315121000", "20231015120000"]);
        assert!(contents.window.is_none());
        assert_eq!(contents.links.down, Some(ViewKey::Month(2023, 3)));
    }

    #[test]
    fn test_maintenance_then_latest() {
        let dir = TempDir::new().unwrap();
        let archive = archive(
            &dir,
            &[
                "2023/11/20/20231120090000.jpg",
                "2023/11/20/Lillevik Lofoten_01_20231120091000.jpg",
            ],
            "20231120120000",
        );
        assert_eq!(archive.latest(), Some(ViewKey::Single(key("20231120090000"))));
        assert_eq!(archive.run_maintenance(), 1);
        assert_eq!(archive.latest(), Some(ViewKey::Single(key("20231120091000"))));
        assert_eq!(archive.run_maintenance(), 0);
    }

    #[test]
    fn test_empty_archive_has_nothing_to_show() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir, &[], "20231120120000");
        assert_eq!(archive.latest(), None);
        let contents = archive.view(&ViewKey::Month(2023, 11), SizeVariant::Mini);
        assert!(contents.images.is_empty());
        assert_eq!(contents.links.down, None);
    }
}
