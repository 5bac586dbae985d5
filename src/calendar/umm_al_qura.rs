//! Umm al-Qura calendar backed by the `hijri_date` lookup table.
//!
//! The table only spans Hijri 1357 to 1499 (roughly Gregorian 1938 to 2076).
//! Dates outside that span are answered by [`TabularCalendar`].

use chrono::{Datelike, NaiveDate};
use hijri_date::HijriDate;
use std::ops::RangeInclusive;

use super::{CalendarSystem, TabularCalendar};

/// Gregorian years accepted by the lookup table.
pub const GREGORIAN_YEARS: RangeInclusive<i32> = 1938..=2076;
/// Hijri years fully described by the lookup table.
pub const HIJRI_YEARS: RangeInclusive<i32> = 1357..=1499;

#[derive(Debug, Clone, Copy, Default)]
pub struct UmmAlQuraCalendar {
    fallback: TabularCalendar,
}

impl UmmAlQuraCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup_gregorian(date: NaiveDate) -> Option<(u32, u32, i32)> {
        if !GREGORIAN_YEARS.contains(&date.year()) {
            return None;
        }
        let hijri = HijriDate::from_gr(
            usize::try_from(date.year()).ok()?,
            date.month() as usize,
            date.day() as usize,
        )
        .ok()?;
        let lunar = (
            u32::try_from(hijri.day()).ok()?,
            u32::try_from(hijri.month()).ok()?,
            i32::try_from(hijri.year()).ok()?,
        );
        // Partial years at either end of the table belong to the fallback.
        HIJRI_YEARS.contains(&lunar.2).then_some(lunar)
    }

    /// First day of `(month, year)`, after folding the month into `1..=12`.
    fn lookup_month(month: u32, year: i32) -> Option<HijriDate> {
        let (month, year) = TabularCalendar::normalize(month, year);
        let year = i32::try_from(year).ok()?;
        if !HIJRI_YEARS.contains(&year) {
            return None;
        }
        HijriDate::from_hijri(usize::try_from(year).ok()?, usize::try_from(month).ok()?, 1).ok()
    }
}

impl CalendarSystem for UmmAlQuraCalendar {
    fn to_lunar(&self, date: NaiveDate) -> (u32, u32, i32) {
        Self::lookup_gregorian(date).unwrap_or_else(|| self.fallback.to_lunar(date))
    }

    fn days_in_month(&self, month: u32, year: i32) -> u32 {
        Self::lookup_month(month, year)
            .and_then(|first| u32::try_from(first.month_len()).ok())
            .unwrap_or_else(|| self.fallback.days_in_month(month, year))
    }

    fn month_start(&self, month: u32, year: i32) -> NaiveDate {
        Self::lookup_month(month, year)
            .and_then(|first| {
                NaiveDate::from_ymd_opt(
                    i32::try_from(first.year_gr()).ok()?,
                    u32::try_from(first.month_gr()).ok()?,
                    u32::try_from(first.day_gr()).ok()?,
                )
            })
            .unwrap_or_else(|| self.fallback.month_start(month, year))
    }
}
