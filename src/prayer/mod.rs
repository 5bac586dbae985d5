//! Daily prayer times with current/next event, countdown and progress.
//!
//! [`PrayerTimeEngine`] is a pure query over an [`AstronomicalSolver`]: it
//! owns no mutable state and can be called from any thread. Instants are kept
//! in UTC; formatting happens in the zone of the reference instant.

pub mod params;
pub mod solver;

pub use params::{CalculationMethod, CalculationParams, HighLatitudeRule, IshaRule, Madhab};
pub use solver::{AstronomicalSolver, SolarSolver, SolvedDay};

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::common::constants::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE};

#[cfg(test)]
mod tests;

/// The six daily events in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Fajr,
        EventKind::Sunrise,
        EventKind::Dhuhr,
        EventKind::Asr,
        EventKind::Maghrib,
        EventKind::Isha,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Sunrise is a marker, not a prayer.
    pub fn is_obligatory(&self) -> bool {
        !matches!(self, EventKind::Sunrise)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EventKind::Fajr => "Fajr",
            EventKind::Sunrise => "Sunrise",
            EventKind::Dhuhr => "Dhuhr",
            EventKind::Asr => "Asr",
            EventKind::Maghrib => "Maghrib",
            EventKind::Isha => "Isha",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// `None` when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }

    /// Mecca, used when no location is configured.
    pub fn fallback() -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTime {
    pub kind: EventKind,
    pub instant: DateTime<Utc>,
    pub formatted_12h: String,
    pub formatted_24h: String,
}

/// The upcoming event with its countdown and the progress of the window
/// leading up to it. `window_elapsed_minutes + countdown_minutes` always
/// equals `window_total_minutes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextEventInfo {
    pub kind: EventKind,
    pub instant: DateTime<Utc>,
    pub formatted_12h: String,
    pub formatted_24h: String,
    pub countdown_minutes: i64,
    pub window_total_minutes: i64,
    pub window_elapsed_minutes: i64,
    /// The event was taken from the following day's solution.
    pub is_tomorrow: bool,
}

impl NextEventInfo {
    /// Elapsed share of the window in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.window_total_minutes <= 0 {
            return 0.0;
        }
        (self.window_elapsed_minutes as f64 / self.window_total_minutes as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEventSet {
    pub ordered_events: Vec<EventTime>,
    pub next_event: Option<NextEventInfo>,
    pub current_event: Option<EventKind>,
    pub reference_date: NaiveDate,
    pub coordinates: Coordinates,
}

impl DailyEventSet {
    /// The five prayers, without Sunrise.
    pub fn obligatory_events(&self) -> impl Iterator<Item = &EventTime> {
        self.ordered_events
            .iter()
            .filter(|event| event.kind.is_obligatory())
    }

    pub fn event(&self, kind: EventKind) -> Option<&EventTime> {
        self.ordered_events.iter().find(|event| event.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_events.is_empty()
    }
}

#[derive(Clone)]
pub struct PrayerTimeEngine {
    solver: Arc<dyn AstronomicalSolver>,
}

impl Default for PrayerTimeEngine {
    fn default() -> Self {
        Self::new(Arc::new(SolarSolver))
    }
}

impl PrayerTimeEngine {
    pub fn new(solver: Arc<dyn AstronomicalSolver>) -> Self {
        Self { solver }
    }

    /// Events for the calendar date of `reference` in its own zone.
    ///
    /// Absent coordinates use the fallback location. Events the solver cannot
    /// place are dropped; a date with no events at all yields an empty set.
    /// When nothing is left today the next event comes from tomorrow's first
    /// event, and if tomorrow has none either there is no next event.
    pub fn daily_events<Z>(
        &self,
        coordinates: Option<Coordinates>,
        reference: &DateTime<Z>,
        params: &CalculationParams,
    ) -> DailyEventSet
    where
        Z: TimeZone,
        Z::Offset: Display,
    {
        let coordinates = coordinates.unwrap_or_else(Coordinates::fallback);
        let zone = reference.timezone();
        let date = reference.date_naive();
        let now = reference.with_timezone(&Utc);

        let today = self.solver.solve(coordinates, date, params);
        if today.is_empty() {
            log_debug!(
                "No events for {} at {:.4}, {:.4}",
                date,
                coordinates.latitude,
                coordinates.longitude
            );
        }

        let ordered_events = today
            .defined()
            .map(|(kind, instant)| event_time(kind, instant, &zone))
            .collect();

        let current_event = self.solver.active_event(&today, now);

        let next_today = self
            .solver
            .next_event_kind_today(&today, now)
            .and_then(|kind| today.get(kind).map(|instant| (kind, instant)));

        let next_event = match next_today {
            Some((kind, instant)) => {
                let window_start = current_event.and_then(|current| today.get(current));
                Some(next_event_info(kind, instant, window_start, now, &zone, false))
            }
            None => date
                .succ_opt()
                .and_then(|tomorrow| self.solver.solve(coordinates, tomorrow, params).first_defined())
                .map(|(kind, instant)| next_event_info(kind, instant, None, now, &zone, true)),
        };

        DailyEventSet {
            ordered_events,
            next_event,
            current_event,
            reference_date: date,
            coordinates,
        }
    }
}

fn event_time<Z>(kind: EventKind, instant: DateTime<Utc>, zone: &Z) -> EventTime
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let (formatted_12h, formatted_24h) = format_instant(instant, zone);
    EventTime {
        kind,
        instant,
        formatted_12h,
        formatted_24h,
    }
}

fn next_event_info<Z>(
    kind: EventKind,
    instant: DateTime<Utc>,
    window_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    zone: &Z,
    is_tomorrow: bool,
) -> NextEventInfo
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let countdown_minutes = whole_minutes(now, instant);
    let window_total_minutes = match window_start {
        Some(start) => whole_minutes(start, instant).max(1).max(countdown_minutes),
        None => countdown_minutes.max(1),
    };
    let (formatted_12h, formatted_24h) = format_instant(instant, zone);

    NextEventInfo {
        kind,
        instant,
        formatted_12h,
        formatted_24h,
        countdown_minutes,
        window_total_minutes,
        window_elapsed_minutes: window_total_minutes - countdown_minutes,
        is_tomorrow,
    }
}

/// Truncated minutes from `from` to `to`, never negative.
fn whole_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    ((to - from).num_milliseconds() / 60_000).max(0)
}

fn format_instant<Z>(instant: DateTime<Utc>, zone: &Z) -> (String, String)
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let local = instant.with_timezone(zone);
    (
        local.format("%-I:%M %p").to_string(),
        local.format("%H:%M").to_string(),
    )
}
