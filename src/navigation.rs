//! # Navigation
//!
//! Computes the four directional links for a view:
//!
//! - **previous / next** move laterally at the same level
//! - **up** moves one level out (Single → Day → Month → Year)
//! - **down** moves one level in, to the first child that has images
//!
//! Links never point into the future: there is no "next" for today or for the
//! current year. Lookups that find nothing simply leave the link empty.

use crate::config::SiteConfig;
use crate::image_index::ImageIndex;
use crate::solar::{Ephemeris, SolarWindowCalculator, SpaEphemeris};
use crate::view::ViewKey;
use crate::TimestampKey;
use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use tracing::{debug, warn};

/// Directional links for one view. Absent links are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NavigationLinks {
    pub previous: Option<ViewKey>,
    pub next: Option<ViewKey>,
    pub up: Option<ViewKey>,
    pub down: Option<ViewKey>,
}

/// Previous and next `(year, month)`, rolling over year boundaries.
///
/// `month` must be 1-12.
pub fn adjacent_months(year: i32, month: u32) -> ((i32, u32), (i32, u32)) {
    let previous = if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    };
    let next = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    (previous, next)
}

pub struct NavigationCalculator<'a, E = SpaEphemeris> {
    index: &'a ImageIndex,
    solar: &'a SolarWindowCalculator<E>,
    latitude: f64,
    longitude: f64,
    today: NaiveDate,
}

impl<'a, E: Ephemeris> NavigationCalculator<'a, E> {
    pub fn new(
        index: &'a ImageIndex,
        solar: &'a SolarWindowCalculator<E>,
        site: &SiteConfig,
        today: NaiveDate,
    ) -> Self {
        NavigationCalculator {
            index,
            solar,
            latitude: site.latitude,
            longitude: site.longitude,
            today,
        }
    }

    pub fn compute_links(&self, view: &ViewKey) -> NavigationLinks {
        let links = match *view {
            ViewKey::Single(key) => self.single_links(key),
            ViewKey::Day(date) => self.day_links(date),
            ViewKey::Month(year, month) => self.month_links(year, month),
            ViewKey::Year(year) => self.year_links(year),
        };
        debug!(%view, ?links, "navigation");
        links
    }

    fn single_links(&self, key: TimestampKey) -> NavigationLinks {
        let (previous, next) = self.index.find_siblings(key.date(), key);
        NavigationLinks {
            previous: previous.map(ViewKey::Single),
            next: next.map(ViewKey::Single),
            up: Some(ViewKey::Day(key.date())),
            down: None,
        }
    }

    fn day_links(&self, date: NaiveDate) -> NavigationLinks {
        let dawn = self
            .solar
            .compute_window(date, self.latitude, self.longitude)
            .dawn;
        let down = self
            .index
            .find_first_image_at_or_after(date, dawn.hour(), dawn.minute(), dawn.second())
            .map(ViewKey::Single);

        NavigationLinks {
            previous: date.pred_opt().map(ViewKey::Day),
            next: date
                .succ_opt()
                .filter(|next| *next <= self.today)
                .map(ViewKey::Day),
            up: Some(ViewKey::Month(date.year(), date.month())),
            down,
        }
    }

    fn month_links(&self, year: i32, month: u32) -> NavigationLinks {
        if !(1..=12).contains(&month) {
            warn!(year, month, "no links for a month outside 1-12");
            return NavigationLinks::default();
        }
        let ((prev_year, prev_month), (next_year, next_month)) = adjacent_months(year, month);
        NavigationLinks {
            previous: Some(ViewKey::Month(prev_year, prev_month)),
            next: Some(ViewKey::Month(next_year, next_month)),
            up: Some(ViewKey::Year(year)),
            down: self
                .index
                .find_first_day_with_images(year, month)
                .map(ViewKey::Day),
        }
    }

    fn year_links(&self, year: i32) -> NavigationLinks {
        let down = (1..=12).find_map(|month| {
            self.index
                .find_first_day_with_images(year, month)
                .map(|_| ViewKey::Month(year, month))
        });
        NavigationLinks {
            previous: Some(ViewKey::Year(year - 1)),
            next: (year < self.today.year()).then_some(ViewKey::Year(year + 1)),
            up: None,
            down,
        }
    }
}
