//! Change detection between two successive phase statuses.

use super::{LunarPhaseStatus, Phase};
use crate::calendar::month_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseChange {
    /// Same phase, same day index and countdown.
    None,
    /// The first day of the target month has begun.
    EnteredMonth { year: i32 },
    /// The target month is over; the countdown now points at next year.
    LeftMonth { next_year: i32 },
    /// Still inside the month, on a later day.
    DayAdvanced { day: u32 },
    /// Still counting down, with a different number of days left.
    CountdownChanged { days: i64 },
}

pub fn detect_phase_change(previous: &LunarPhaseStatus, current: &LunarPhaseStatus) -> PhaseChange {
    match (previous.phase, current.phase) {
        (Phase::Pre | Phase::Post, Phase::During) => PhaseChange::EnteredMonth {
            year: current.target_month_year,
        },
        (Phase::During, Phase::Pre | Phase::Post) => PhaseChange::LeftMonth {
            next_year: current.target_month_year,
        },
        (Phase::During, Phase::During)
            if previous.current_day_in_target_month != current.current_day_in_target_month =>
        {
            PhaseChange::DayAdvanced {
                day: current.current_day_in_target_month,
            }
        }
        (Phase::During, Phase::During) => PhaseChange::None,
        _ if previous.days_until_target_month != current.days_until_target_month
            || previous.target_month_year != current.target_month_year =>
        {
            PhaseChange::CountdownChanged {
                days: current.days_until_target_month,
            }
        }
        _ => PhaseChange::None,
    }
}

/// Announce a change in the block log style.
pub fn log_phase_change(change: &PhaseChange, target_month: u32) {
    let name = month_name(target_month);
    match change {
        PhaseChange::None => {}
        PhaseChange::EnteredMonth { year } => {
            log_block_start!("Entering {} {} ☾", name, year);
        }
        PhaseChange::LeftMonth { next_year } => {
            log_block_start!("{} has ended", name);
            log_indented!("Counting down to {} {}", name, next_year);
        }
        PhaseChange::DayAdvanced { day } => {
            log_decorated!("{} day {}", name, day);
        }
        PhaseChange::CountdownChanged { days } => {
            log_decorated!("{} days until {}", days, name);
        }
    }
}
