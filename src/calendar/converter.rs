//! Instant-level calendar queries bound to a display time zone.
//!
//! A Gregorian *instant* only maps to a lunar *date* once a time zone decides
//! which calendar day it falls on, so the converter carries one. Month starts
//! are reported as local midnight of the month's first day.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

use super::grid::{DayCell, month_grid};
use super::{CalendarSystem, LunarDate, next_month};

/// Whole days from `a` to `b`, floored, and clamped to 0 when `b` precedes `a`.
pub fn days_between<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> i64 {
    let span = b.with_timezone(&Utc) - a.with_timezone(&Utc);
    span.num_days().max(0)
}

#[derive(Clone)]
pub struct CalendarConverter<Z: TimeZone> {
    calendar: Arc<dyn CalendarSystem>,
    zone: Z,
}

impl<Z: TimeZone> CalendarConverter<Z> {
    pub fn new(calendar: Arc<dyn CalendarSystem>, zone: Z) -> Self {
        Self { calendar, zone }
    }

    pub fn zone(&self) -> &Z {
        &self.zone
    }

    pub fn calendar(&self) -> &dyn CalendarSystem {
        self.calendar.as_ref()
    }

    /// Lunar date of the local calendar day `instant` falls on.
    pub fn gregorian_to_lunar<T: TimeZone>(&self, instant: &DateTime<T>) -> LunarDate {
        let local_date = instant.with_timezone(&self.zone).date_naive();
        let (day, month, year) = self.calendar.to_lunar(local_date);
        LunarDate {
            day,
            month,
            year,
            gregorian: instant.with_timezone(&Utc),
        }
    }

    pub fn days_in_lunar_month(&self, month: u32, year: i32) -> u32 {
        self.calendar.days_in_month(month, year)
    }

    /// Local midnight of the first day of `month` in `year`.
    pub fn lunar_month_start(&self, month: u32, year: i32) -> DateTime<Z> {
        self.local_midnight(self.calendar.month_start(month, year))
    }

    /// Start of the month after `(month, year)`.
    pub fn next_lunar_month_start(&self, month: u32, year: i32) -> DateTime<Z> {
        let (month, year) = next_month(month, year);
        self.lunar_month_start(month, year)
    }

    pub fn days_between<A: TimeZone, B: TimeZone>(&self, a: &DateTime<A>, b: &DateTime<B>) -> i64 {
        days_between(a, b)
    }

    /// Local midnight of the day `instant` falls on.
    pub fn start_of_day<T: TimeZone>(&self, instant: &DateTime<T>) -> DateTime<Z> {
        self.local_midnight(instant.with_timezone(&self.zone).date_naive())
    }

    /// Grid cells for `(month, year)` with today's cell flagged.
    pub fn month_grid<T: TimeZone>(&self, month: u32, year: i32, today: &DateTime<T>) -> Vec<DayCell> {
        let today = self.gregorian_to_lunar(today);
        month_grid(
            self.calendar.as_ref(),
            month,
            year,
            Some((today.day, today.month, today.year)),
        )
    }

    /// First valid local instant of `date`.
    ///
    /// Zones that skip midnight on a DST change start the day at the first
    /// hour that exists.
    fn local_midnight(&self, date: NaiveDate) -> DateTime<Z> {
        (0..4)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .find_map(|time| self.zone.from_local_datetime(&date.and_time(time)).earliest())
            .unwrap_or_else(|| self.zone.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
    }
}
