//! Gregorian to Hijri calendar conversion and derived month queries.
//!
//! ## Module Structure
//!
//! - [`umm_al_qura`]: the Umm al-Qura calendar, the default
//!   [`CalendarSystem`] implementation
//! - [`tabular`]: the arithmetic (30-year cycle) Hijri calendar, used outside
//!   the Umm al-Qura table
//! - [`converter`]: instant-level queries bound to a time zone (conversion,
//!   month starts, whole-day differences)
//! - [`grid`]: the month grid laid out Sunday-first for a 6×7 renderer
//!
//! The epoch and leap rules live entirely behind [`CalendarSystem`]; everything
//! else in this module is composed from single-date conversion and works with
//! any implementation.

pub mod converter;
pub mod grid;
pub mod tabular;
pub mod umm_al_qura;

pub use converter::{CalendarConverter, days_between};
pub use grid::{DayCell, GRID_CELLS, month_grid, pad_grid};
pub use tabular::TabularCalendar;
pub use umm_al_qura::UmmAlQuraCalendar;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;


/// Calendar-system capability consumed by the converter.
///
/// Months and days are 1-based. Implementations must be pure: the same input
/// always yields the same output.
pub trait CalendarSystem: Send + Sync {
    /// Convert a Gregorian calendar date to `(day, month, year)`.
    fn to_lunar(&self, date: NaiveDate) -> (u32, u32, i32);

    /// Number of days in `month` of `year` (29 or 30 for lunar calendars).
    fn days_in_month(&self, month: u32, year: i32) -> u32;

    /// Gregorian date of the first day of `month` in `year`.
    fn month_start(&self, month: u32, year: i32) -> NaiveDate;
}

/// Transliterated month names, indexed by `month - 1`.
pub const MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Ula",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhul Qi'dah",
    "Dhul Hijjah",
];

/// Name of a 1-based lunar month, or `"?"` when out of range.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("?")
}

/// The month following `(month, year)`, wrapping into the next year.
pub fn next_month(month: u32, year: i32) -> (u32, i32) {
    if month >= 12 {
        (1, year + 1)
    } else {
        (month + 1, year)
    }
}

/// A lunar date together with the instant it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunarDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub gregorian: DateTime<Utc>,
}

impl LunarDate {
    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }

    /// True when both values name the same lunar day, ignoring the instant.
    pub fn same_day(&self, other: &LunarDate) -> bool {
        (self.year, self.month, self.day) == (other.year, other.month, other.day)
    }

    /// Format as `15 Ramadan 1447 AH`.
    pub fn formatted(&self) -> String {
        format!("{} {} {} AH", self.day, self.month_name(), self.year)
    }
}
