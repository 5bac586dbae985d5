//! Target-month phase tracking (before, during, after a named lunar month).
//!
//! The phase is never stored: [`LunarPhaseEngine::status`] recomputes it from
//! "now" on every call, so transitions happen implicitly when the clock crosses
//! a month boundary. [`detection`] compares two successive statuses for
//! renderers that want to announce those transitions.

pub mod detection;

pub use detection::{PhaseChange, detect_phase_change, log_phase_change};

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::calendar::CalendarConverter;
use crate::common::constants::DEFAULT_TARGET_MONTH;


/// Position of "now" relative to the target month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Pre,
    During,
    Post,
}

impl Phase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Pre => "Before",
            Phase::During => "During",
            Phase::Post => "After",
        }
    }
}

/// Phase plus the one countdown or day index that is meaningful for it.
///
/// `days_until_target_month` is zero during the month and
/// `current_day_in_target_month` is zero outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunarPhaseStatus {
    pub phase: Phase,
    pub days_until_target_month: i64,
    pub current_day_in_target_month: u32,
    pub total_days_in_target_month: u32,
    /// Lunar year of the occurrence the status refers to. After the month
    /// this is the following year.
    pub target_month_year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarPhaseEngine {
    target_month: u32,
}

impl Default for LunarPhaseEngine {
    fn default() -> Self {
        Self {
            target_month: DEFAULT_TARGET_MONTH,
        }
    }
}

impl LunarPhaseEngine {
    /// Track `target_month` (1..=12). Out-of-range values fall back to the
    /// ninth month with a warning.
    pub fn new(target_month: u32) -> Self {
        if !(1..=12).contains(&target_month) {
            log_warning!(
                "Target month {} is out of range (1-12), using {}",
                target_month,
                DEFAULT_TARGET_MONTH
            );
            return Self::default();
        }
        Self { target_month }
    }

    pub fn target_month(&self) -> u32 {
        self.target_month
    }

    /// Classify `now` against the target month.
    ///
    /// Countdowns are whole calendar days counted from the start of `now`'s
    /// local day, so the day before the month reports 1.
    pub fn status<Z: TimeZone, T: TimeZone>(
        &self,
        converter: &CalendarConverter<Z>,
        now: &DateTime<T>,
    ) -> LunarPhaseStatus {
        let today = converter.gregorian_to_lunar(now);
        let target = self.target_month;

        if today.month == target {
            return LunarPhaseStatus {
                phase: Phase::During,
                days_until_target_month: 0,
                current_day_in_target_month: today.day,
                total_days_in_target_month: converter.days_in_lunar_month(target, today.year),
                target_month_year: today.year,
            };
        }

        let (phase, year) = if today.month < target {
            (Phase::Pre, today.year)
        } else {
            (Phase::Post, today.year + 1)
        };

        let day_start = converter.start_of_day(now);
        let month_start = converter.lunar_month_start(target, year);

        LunarPhaseStatus {
            phase,
            days_until_target_month: converter.days_between(&day_start, &month_start),
            current_day_in_target_month: 0,
            total_days_in_target_month: converter.days_in_lunar_month(target, year),
            target_month_year: year,
        }
    }
}
