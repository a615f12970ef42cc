//! # Solar Window Calculator
//!
//! Computes the daily display window (dawn, sunrise, sunset, dusk) for the
//! camera site.
//!
//! ## Three Regimes
//!
//! ### Midnight Sun
//! Inside the configured midnight-sun period the sun never sets, so the whole
//! day is shown: dawn = sunrise = 00:00:01, sunset = dusk = 23:59:59.
//!
//! ### Polar Night
//! Inside the configured polar-night period the sun never rises. A narrow fake
//! window built from the configured hours keeps a few images on screen:
//! dawn = sunrise − adjust, dusk = sunset + adjust.
//!
//! ### Normal Days
//! Sunrise, sunset and twilight come from an [`Ephemeris`]. On borderline
//! dates close to the polar periods the ephemeris may have nothing to report;
//! missing values are replaced locally:
//! - sunrise → 00:00:00, sunset → 23:59:59
//! - dawn → sunrise − adjust, dusk → sunset + adjust
//!
//! Every window is finally clamped into its calendar date, see
//! [`DaylightWindow::clamped`].

use crate::config::SeasonConfig;
use crate::{end_of_day, start_of_day, DaylightWindow};
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use solar_positioning::{spa, time::DeltaT, Horizon, SunriseResult};
use tracing::{debug, trace, warn};

/// Twilight definition used for dawn and dusk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Twilight {
    /// Sun 6° below the horizon
    Civil,
    /// Sun 12° below the horizon
    Nautical,
}

impl Twilight {
    pub fn horizon(self) -> Horizon {
        match self {
            Twilight::Civil => Horizon::CivilTwilight,
            Twilight::Nautical => Horizon::NauticalTwilight,
        }
    }
}

/// Raw events reported by an ephemeris for one date, in site-local time.
///
/// `None` means the event could not be computed for that date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SunEvents {
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    pub twilight_begin: Option<NaiveDateTime>,
    pub twilight_end: Option<NaiveDateTime>,
}

/// Source of sunrise, sunset and twilight instants.
pub trait Ephemeris {
    fn sun_events(&self, date: NaiveDate, latitude: f64, longitude: f64) -> SunEvents;
}

/// [`Ephemeris`] backed by the NREL Solar Position Algorithm.
#[derive(Clone, Copy, Debug)]
pub struct SpaEphemeris {
    timezone: Tz,
    twilight: Twilight,
}

impl SpaEphemeris {
    pub fn new(timezone: Tz, twilight: Twilight) -> Self {
        SpaEphemeris { timezone, twilight }
    }
}

impl Ephemeris for SpaEphemeris {
    fn sun_events(&self, date: NaiveDate, latitude: f64, longitude: f64) -> SunEvents {
        // SPA works on the UTC calendar day of the instant it is given.
        let anchor = self.timezone.from_utc_datetime(&start_of_day(date));
        let delta_t = match DeltaT::estimate_from_date_like(date) {
            Ok(delta_t) => delta_t,
            Err(e) => {
                warn!(%date, "no delta T estimate: {e}");
                return SunEvents::default();
            }
        };

        let crossings = |horizon: Horizon| {
            match spa::sunrise_sunset_for_horizon(
                anchor.clone(),
                latitude,
                longitude,
                delta_t,
                horizon,
            ) {
                Ok(SunriseResult::RegularDay {
                    sunrise, sunset, ..
                }) => (Some(sunrise.naive_local()), Some(sunset.naive_local())),
                Ok(SunriseResult::AllDay { .. }) | Ok(SunriseResult::AllNight { .. }) => {
                    (None, None)
                }
                Err(e) => {
                    warn!(%date, latitude, longitude, "ephemeris failed: {e}");
                    (None, None)
                }
            }
        };

        let (sunrise, sunset) = crossings(Horizon::SunriseSunset);
        let (twilight_begin, twilight_end) = crossings(self.twilight.horizon());
        SunEvents {
            sunrise,
            sunset,
            twilight_begin,
            twilight_end,
        }
    }
}

/// Daylight window calculator for one site configuration.
pub struct SolarWindowCalculator<E = SpaEphemeris> {
    seasons: SeasonConfig,
    ephemeris: E,
}

impl<E: Ephemeris> SolarWindowCalculator<E> {
    pub fn new(seasons: SeasonConfig, ephemeris: E) -> Self {
        SolarWindowCalculator { seasons, ephemeris }
    }

    pub fn seasons(&self) -> &SeasonConfig {
        &self.seasons
    }

    /// Daylight window for `date` at the given coordinates.
    ///
    /// Never fails: degenerate ephemeris output is replaced by whole-day
    /// bounds and the result is always clamped into `date`.
    pub fn compute_window(&self, date: NaiveDate, latitude: f64, longitude: f64) -> DaylightWindow {
        let window = if self.seasons.midnight_sun.contains(date) {
            debug!(%date, "midnight sun");
            self.midnight_sun_window(date)
        } else if self.seasons.polar_night.contains(date) {
            debug!(%date, "polar night");
            self.polar_night_window(date)
        } else {
            self.normal_window(date, latitude, longitude)
        };
        trace!(
            %date,
            dawn = %window.dawn,
            sunrise = %window.sunrise,
            sunset = %window.sunset,
            dusk = %window.dusk,
            "daylight window"
        );
        window
    }

    fn adjust(&self) -> Duration {
        Duration::hours(i64::from(self.seasons.dawn_dusk_adjust_hours))
    }

    fn midnight_sun_window(&self, date: NaiveDate) -> DaylightWindow {
        let sunrise = start_of_day(date) + Duration::seconds(1);
        let sunset = end_of_day(date);
        DaylightWindow {
            date,
            sunrise,
            sunset,
            dawn: sunrise,
            dusk: sunset,
            midnight_sun: true,
            polar_night: false,
        }
    }

    fn polar_night_window(&self, date: NaiveDate) -> DaylightWindow {
        let midnight = start_of_day(date);
        let sunrise = midnight + Duration::hours(i64::from(self.seasons.polar_night_sunrise_hour));
        let sunset = midnight + Duration::hours(i64::from(self.seasons.polar_night_sunset_hour));
        DaylightWindow {
            date,
            sunrise,
            sunset,
            dawn: sunrise - self.adjust(),
            dusk: sunset + self.adjust(),
            midnight_sun: false,
            polar_night: true,
        }
        .clamped()
    }

    fn normal_window(&self, date: NaiveDate, latitude: f64, longitude: f64) -> DaylightWindow {
        let events = self.ephemeris.sun_events(date, latitude, longitude);
        let on_date = |instant: Option<NaiveDateTime>| instant.filter(|t| t.date() == date);

        let sunrise = on_date(events.sunrise).unwrap_or_else(|| {
            debug!(%date, reported = ?events.sunrise, "no sunrise, using start of day");
            start_of_day(date)
        });
        let sunset = on_date(events.sunset).unwrap_or_else(|| {
            debug!(%date, reported = ?events.sunset, "no sunset, using end of day");
            end_of_day(date)
        });
        let dawn = events.twilight_begin.unwrap_or_else(|| {
            debug!(%date, "no twilight begin, dawn = sunrise - adjust");
            sunrise - self.adjust()
        });
        let dusk = events.twilight_end.unwrap_or_else(|| {
            debug!(%date, "no twilight end, dusk = sunset + adjust");
            sunset + self.adjust()
        });

        DaylightWindow {
            date,
            sunrise,
            sunset,
            dawn,
            dusk,
            midnight_sun: false,
            polar_night: false,
        }
        .clamped()
    }
}

impl SolarWindowCalculator<SpaEphemeris> {
    /// Calculator using SPA ephemeris in the site timezone.
    pub fn spa(seasons: SeasonConfig, timezone: Tz) -> Self {
        let ephemeris = SpaEphemeris::new(timezone, seasons.twilight);
        SolarWindowCalculator::new(seasons, ephemeris)
    }
}
