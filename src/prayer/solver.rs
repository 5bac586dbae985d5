//! Astronomical solver capability and its solar-geometry implementation.
//!
//! [`SolarSolver`] follows the usual prayer-time model: the sun's declination
//! and the equation of time are taken from a low-precision solar ephemeris
//! (good to about a minute between 1950 and 2050), and each event is the time
//! the sun reaches a given altitude on the morning or evening side of solar
//! transit. Events the sun never reaches on a date come back as `None`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use super::params::{CalculationMethod, CalculationParams, IshaRule};
use super::{Coordinates, EventKind};

/// Altitude of the sun's upper limb at sunrise and sunset, including refraction.
const HORIZON_DEPRESSION: f64 = 0.833;

/// JD of 0001-01-01 00:00 UTC minus one day, so `num_days_from_ce` lines up.
const JD_CE_OFFSET: f64 = 1_721_424.5;
const J2000: f64 = 2_451_545.0;

/// Solved instants for one date, indexed by [`EventKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SolvedDay {
    times: [Option<DateTime<Utc>>; 6],
}

impl SolvedDay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: EventKind, time: Option<DateTime<Utc>>) -> Self {
        self.times[kind.index()] = time;
        self
    }

    pub fn get(&self, kind: EventKind) -> Option<DateTime<Utc>> {
        self.times[kind.index()]
    }

    /// Defined events in canonical order.
    pub fn defined(&self) -> impl Iterator<Item = (EventKind, DateTime<Utc>)> + '_ {
        EventKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|time| (kind, time)))
    }

    pub fn first_defined(&self) -> Option<(EventKind, DateTime<Utc>)> {
        self.defined().next()
    }

    pub fn is_empty(&self) -> bool {
        self.times.iter().all(Option::is_none)
    }

    /// Last defined event at or before `instant`.
    pub fn active_at(&self, instant: DateTime<Utc>) -> Option<EventKind> {
        self.defined()
            .filter(|(_, time)| *time <= instant)
            .last()
            .map(|(kind, _)| kind)
    }

    /// First defined event strictly after `instant`.
    pub fn next_after(&self, instant: DateTime<Utc>) -> Option<EventKind> {
        self.defined()
            .find(|(_, time)| *time > instant)
            .map(|(kind, _)| kind)
    }
}

/// Produces daily event instants for a location.
///
/// Only `solve` is required; the active and next-event queries run against a
/// day `solve` already produced and default to scanning it.
pub trait AstronomicalSolver: Send + Sync {
    fn solve(&self, coordinates: Coordinates, date: NaiveDate, params: &CalculationParams)
    -> SolvedDay;

    fn active_event(&self, day: &SolvedDay, instant: DateTime<Utc>) -> Option<EventKind> {
        day.active_at(instant)
    }

    fn next_event_kind_today(&self, day: &SolvedDay, instant: DateTime<Utc>) -> Option<EventKind> {
        day.next_after(instant)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolarSolver;

impl AstronomicalSolver for SolarSolver {
    fn solve(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        params: &CalculationParams,
    ) -> SolvedDay {
        let day = SolarDay::new(coordinates, date);

        // First pass from typical day fractions, second pass from the first
        // pass's own results.
        let mut hours = day.pass(params, &INITIAL_GUESS.map(Some));
        hours = day.pass(params, &hours);

        if let IshaRule::MinutesAfterMaghrib(minutes) = params.method.isha_rule() {
            hours[EventKind::Isha.index()] =
                hours[EventKind::Maghrib.index()].map(|maghrib| maghrib + f64::from(minutes) / 60.0);
        }

        if params.method == CalculationMethod::MoonSighting {
            day.bound_seasonal(&mut hours);
        } else {
            day.bound_high_latitude(params, &mut hours);
        }

        let adjustments = params.method.method_adjustments();
        let mut solved = SolvedDay::new();
        for kind in EventKind::ALL {
            let instant = hours[kind.index()]
                .map(|h| h + f64::from(adjustments[kind.index()]) / 60.0)
                .and_then(|h| day.to_instant(h));
            solved = solved.with(kind, instant);
        }
        solved
    }
}

/// Approximate local solar hours used to seed the first pass.
const INITIAL_GUESS: [f64; 6] = [5.0, 6.0, 12.0, 13.0, 18.0, 18.0];

struct SolarDay {
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    /// Julian day of local solar midnight.
    jd: f64,
}

impl SolarDay {
    fn new(coordinates: Coordinates, date: NaiveDate) -> Self {
        let jd = f64::from(date.num_days_from_ce()) + JD_CE_OFFSET - coordinates.longitude / (15.0 * 24.0);
        Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            date,
            jd,
        }
    }

    /// One evaluation of every event, each at its own estimated time of day.
    /// Times are local mean solar hours.
    fn pass(&self, params: &CalculationParams, estimate: &[Option<f64>; 6]) -> [Option<f64>; 6] {
        let at = |kind: EventKind| {
            estimate[kind.index()].unwrap_or(INITIAL_GUESS[kind.index()]) / 24.0
        };

        let isha = match params.method.isha_rule() {
            IshaRule::Angle(angle) => self.sun_angle_time(angle, at(EventKind::Isha), false),
            IshaRule::MinutesAfterMaghrib(_) => None,
        };

        [
            self.sun_angle_time(params.method.fajr_angle(), at(EventKind::Fajr), true),
            self.sun_angle_time(HORIZON_DEPRESSION, at(EventKind::Sunrise), true),
            Some(self.mid_day(at(EventKind::Dhuhr))),
            self.asr_time(params.madhab.shadow_factor(), at(EventKind::Asr)),
            self.sun_angle_time(HORIZON_DEPRESSION, at(EventKind::Maghrib), false),
            isha,
        ]
    }

    fn mid_day(&self, fraction: f64) -> f64 {
        let (_, equation_of_time) = sun_position(self.jd + fraction);
        fix_hour(12.0 - equation_of_time)
    }

    /// Time the sun is `depression` degrees below the horizon, before transit
    /// when `morning`.
    fn sun_angle_time(&self, depression: f64, fraction: f64, morning: bool) -> Option<f64> {
        let (declination, _) = sun_position(self.jd + fraction);
        let noon = self.mid_day(fraction);
        let cos_hour_angle = (-dsin(depression) - dsin(declination) * dsin(self.latitude))
            / (dcos(declination) * dcos(self.latitude));

        if !cos_hour_angle.is_finite() || !(-1.0..=1.0).contains(&cos_hour_angle) {
            return None;
        }

        let offset = dacos(cos_hour_angle) / 15.0;
        Some(if morning { noon - offset } else { noon + offset })
    }

    fn asr_time(&self, shadow_factor: f64, fraction: f64) -> Option<f64> {
        let (declination, _) = sun_position(self.jd + fraction);
        let altitude = darccot(shadow_factor + dtan((self.latitude - declination).abs()));
        self.sun_angle_time(-altitude, fraction, false)
    }

    /// Clamp Fajr and Isha to a portion of the night when the rule asks for it.
    fn bound_high_latitude(&self, params: &CalculationParams, hours: &mut [Option<f64>; 6]) {
        let rule = params.high_latitude_rule;
        let (Some(sunrise), Some(sunset)) = (
            hours[EventKind::Sunrise.index()],
            hours[EventKind::Maghrib.index()],
        ) else {
            return;
        };
        let night = time_diff(sunset, sunrise);

        let fajr_angle = params.method.fajr_angle();
        if let Some(portion) = rule.night_portion(fajr_angle) {
            let limit = night * portion;
            let fajr = &mut hours[EventKind::Fajr.index()];
            if fajr.is_none_or(|f| time_diff(f, sunrise) > limit) {
                *fajr = Some(sunrise - limit);
            }
        }

        if let IshaRule::Angle(isha_angle) = params.method.isha_rule() {
            if let Some(portion) = rule.night_portion(isha_angle) {
                let limit = night * portion;
                let isha = &mut hours[EventKind::Isha.index()];
                if isha.is_none_or(|i| time_diff(sunset, i) > limit) {
                    *isha = Some(sunset + limit);
                }
            }
        }
    }

    /// Moonsighting Committee limits: above 55° Fajr and Isha start at a
    /// seventh of the night, and everywhere they may sit no further from
    /// sunrise and sunset than the seasonal twilight curve allows.
    fn bound_seasonal(&self, hours: &mut [Option<f64>; 6]) {
        let (Some(sunrise), Some(sunset)) = (
            hours[EventKind::Sunrise.index()],
            hours[EventKind::Maghrib.index()],
        ) else {
            return;
        };
        let night = time_diff(sunset, sunrise);
        let days = self.days_since_solstice();

        let fajr = &mut hours[EventKind::Fajr.index()];
        if self.latitude >= 55.0 {
            *fajr = Some(sunrise - night / 7.0);
        }
        let earliest = sunrise - seasonal_minutes(self.latitude, days, MORNING_TWILIGHT) / 60.0;
        if fajr.is_none_or(|f| time_diff(f, sunrise) > time_diff(earliest, sunrise)) {
            *fajr = Some(earliest);
        }

        let isha = &mut hours[EventKind::Isha.index()];
        if self.latitude >= 55.0 {
            *isha = Some(sunset + night / 7.0);
        }
        let latest = sunset + seasonal_minutes(self.latitude, days, EVENING_TWILIGHT) / 60.0;
        if isha.is_none_or(|i| time_diff(sunset, i) > time_diff(sunset, latest)) {
            *isha = Some(latest);
        }
    }

    /// Days since the winter solstice of the local hemisphere, approximated
    /// as 21 December in the north and 21 June in the south.
    fn days_since_solstice(&self) -> f64 {
        let day_of_year = i64::from(self.date.ordinal());
        let leap = NaiveDate::from_ymd_opt(self.date.year(), 2, 29).is_some();
        let days_in_year = if leap { 366 } else { 365 };

        let days = if self.latitude >= 0.0 {
            day_of_year + 10
        } else {
            day_of_year - if leap { 173 } else { 172 }
        };
        days.rem_euclid(days_in_year) as f64
    }

    /// Local solar hours on this date to a UTC instant, rounded to the minute.
    fn to_instant(&self, hours: f64) -> Option<DateTime<Utc>> {
        let utc_hours = hours - self.longitude / 15.0;
        if !utc_hours.is_finite() {
            return None;
        }
        let minutes = (utc_hours * 60.0).round() as i64;
        let midnight = self.date.and_time(NaiveTime::MIN).and_utc();
        midnight.checked_add_signed(Duration::minutes(minutes))
    }
}

/// Seasonal twilight coefficients: minutes added to a 75 minute base per 55°
/// of latitude, at the solstice and 91, 137 and 183 days after it.
const MORNING_TWILIGHT: [f64; 4] = [28.65, 19.44, 32.74, 48.10];
const EVENING_TWILIGHT: [f64; 4] = [25.60, 2.050, -9.21, 6.14];

/// Minutes between twilight and sunrise or sunset on the seasonal curve,
/// interpolated linearly between the anchor days and mirrored after 183.
fn seasonal_minutes(latitude: f64, days_since_solstice: f64, coefficients: [f64; 4]) -> f64 {
    let [a, b, c, d] = coefficients.map(|k| 75.0 + k / 55.0 * latitude.abs());
    match days_since_solstice {
        t if t < 91.0 => a + (b - a) / 91.0 * t,
        t if t < 137.0 => b + (c - b) / 46.0 * (t - 91.0),
        t if t < 183.0 => c + (d - c) / 46.0 * (t - 137.0),
        t if t < 229.0 => d + (c - d) / 46.0 * (t - 183.0),
        t if t < 275.0 => c + (b - c) / 46.0 * (t - 229.0),
        t => b + (a - b) / 91.0 * (t - 275.0),
    }
}

/// Declination (degrees) and equation of time (hours) for a Julian day.
fn sun_position(jd: f64) -> (f64, f64) {
    let d = jd - J2000;
    let mean_anomaly = fix_angle(357.529 + 0.985_600_28 * d);
    let mean_longitude = fix_angle(280.459 + 0.985_647_36 * d);
    let ecliptic_longitude = fix_angle(
        mean_longitude + 1.915 * dsin(mean_anomaly) + 0.020 * dsin(2.0 * mean_anomaly),
    );
    let obliquity = 23.439 - 0.000_000_36 * d;

    let right_ascension = fix_hour(
        datan2(
            dcos(obliquity) * dsin(ecliptic_longitude),
            dcos(ecliptic_longitude),
        ) / 15.0,
    );
    let equation_of_time = mean_longitude / 15.0 - right_ascension;
    let declination = dasin(dsin(obliquity) * dsin(ecliptic_longitude));

    (declination, equation_of_time)
}

fn time_diff(from: f64, to: f64) -> f64 {
    fix_hour(to - from)
}

fn fix_angle(a: f64) -> f64 {
    a.rem_euclid(360.0)
}

fn fix_hour(h: f64) -> f64 {
    h.rem_euclid(24.0)
}

fn dsin(d: f64) -> f64 {
    d.to_radians().sin()
}

fn dcos(d: f64) -> f64 {
    d.to_radians().cos()
}

fn dtan(d: f64) -> f64 {
    d.to_radians().tan()
}

fn dasin(x: f64) -> f64 {
    x.asin().to_degrees()
}

fn dacos(x: f64) -> f64 {
    x.acos().to_degrees()
}

fn datan2(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}

fn darccot(x: f64) -> f64 {
    (1.0 / x).atan().to_degrees()
}
