//! Arithmetic Hijri calendar, used where the Umm al-Qura table has no data.
//!
//! Years run in 30-year cycles with eleven 355-day leap years (2, 5, 7, 10, 13,
//! 16, 18, 21, 24, 26, 29). Odd months have 30 days, even months 29, and the
//! twelfth month gains the leap day. Day numbers are counted from the civil
//! epoch, 1 Muharram 1 AH = 19 July 622 (proleptic Gregorian).

use chrono::{Datelike, NaiveDate};

use super::CalendarSystem;

/// `NaiveDate::num_days_from_ce` of 1 Muharram 1 AH.
const EPOCH_DAYS_FROM_CE: i64 = 227_015;

#[derive(Debug, Clone, Copy, Default)]
pub struct TabularCalendar;

impl TabularCalendar {
    pub fn new() -> Self {
        Self
    }

    /// Whether `year` has 355 days.
    pub fn is_leap_year(year: i32) -> bool {
        (14 + 11 * i64::from(year)).rem_euclid(30) < 11
    }

    fn days_before_year(year: i64) -> i64 {
        (year - 1) * 354 + (3 + 11 * year).div_euclid(30)
    }

    fn days_before_month(month: i64) -> i64 {
        (59 * (month - 1) + 1) / 2
    }

    /// Fold an out-of-range month into `1..=12`, carrying into the year.
    pub(super) fn normalize(month: u32, year: i32) -> (i64, i64) {
        let zero_based = i64::from(month) - 1;
        (
            zero_based.rem_euclid(12) + 1,
            i64::from(year) + zero_based.div_euclid(12),
        )
    }

    fn date_from_epoch_days(days: i64) -> NaiveDate {
        i32::try_from(days + EPOCH_DAYS_FROM_CE)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .unwrap_or(if days < 0 {
                NaiveDate::MIN
            } else {
                NaiveDate::MAX
            })
    }
}

impl CalendarSystem for TabularCalendar {
    fn to_lunar(&self, date: NaiveDate) -> (u32, u32, i32) {
        let days = i64::from(date.num_days_from_ce()) - EPOCH_DAYS_FROM_CE;

        // First estimate can be off by one near year boundaries.
        let mut year = (30 * days + 10646).div_euclid(10631);
        while Self::days_before_year(year + 1) <= days {
            year += 1;
        }
        while Self::days_before_year(year) > days {
            year -= 1;
        }

        let day_of_year = days - Self::days_before_year(year);
        let mut month = 1;
        while month < 12 && Self::days_before_month(month + 1) <= day_of_year {
            month += 1;
        }
        let day = day_of_year - Self::days_before_month(month) + 1;

        (day as u32, month as u32, year as i32)
    }

    fn days_in_month(&self, month: u32, year: i32) -> u32 {
        let (month, year) = Self::normalize(month, year);
        match month {
            12 if Self::is_leap_year(year as i32) => 30,
            12 => 29,
            m if m % 2 == 1 => 30,
            _ => 29,
        }
    }

    fn month_start(&self, month: u32, year: i32) -> NaiveDate {
        let (month, year) = Self::normalize(month, year);
        Self::date_from_epoch_days(Self::days_before_year(year) + Self::days_before_month(month))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn epoch_constant_matches_civil_epoch() {
        assert_eq!(
            date(622, 7, 19).num_days_from_ce() as i64,
            EPOCH_DAYS_FROM_CE
        );
        assert_eq!(TabularCalendar.to_lunar(date(622, 7, 19)), (1, 1, 1));
    }

    #[test]
    fn known_month_starts() {
        let calendar = TabularCalendar;
        assert_eq!(calendar.month_start(9, 1446), date(2025, 3, 1));
        assert_eq!(calendar.month_start(9, 1447), date(2026, 2, 18));
        assert_eq!(calendar.month_start(10, 1447), date(2026, 3, 20));
        assert_eq!(calendar.month_start(1, 1448), date(2026, 6, 17));
        assert_eq!(calendar.month_start(9, 1448), date(2027, 2, 8));
    }

    #[test]
    fn converts_around_month_boundary() {
        let calendar = TabularCalendar;
        assert_eq!(calendar.to_lunar(date(2026, 2, 17)), (29, 8, 1447));
        assert_eq!(calendar.to_lunar(date(2026, 2, 18)), (1, 9, 1447));
        assert_eq!(calendar.to_lunar(date(2026, 3, 19)), (30, 9, 1447));
        assert_eq!(calendar.to_lunar(date(2026, 3, 20)), (1, 10, 1447));
    }

    #[test]
    fn leap_years_follow_cycle() {
        let leap: Vec<i32> = (1..=30)
            .filter(|y| TabularCalendar::is_leap_year(*y))
            .collect();
        assert_eq!(leap, vec![2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29]);
    }

    #[test]
    fn month_lengths_sum_to_year_length() {
        let calendar = TabularCalendar;
        for year in [1446, 1447, 1448] {
            let total: u32 = (1..=12).map(|m| calendar.days_in_month(m, year)).sum();
            let expected = if TabularCalendar::is_leap_year(year) {
                355
            } else {
                354
            };
            assert_eq!(total, expected, "year {year}");
        }
    }

    #[test]
    fn month_thirteen_wraps_into_next_year() {
        let calendar = TabularCalendar;
        assert_eq!(calendar.month_start(13, 1447), calendar.month_start(1, 1448));
    }
}
