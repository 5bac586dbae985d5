//! Month grid generation.
//!
//! The grid is Sunday-first: the first day of the month is preceded by as many
//! blank cells as its weekday index (Sunday = 0). Trailing blanks are left to
//! the renderer, which can call [`pad_grid`] when it wants a fixed 6×7 layout.

use chrono::Datelike;
use serde::Serialize;

use super::CalendarSystem;

/// Cells in a fixed 6×7 month grid.
pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    /// Day of the month, 0 for blank padding.
    pub day_number: u32,
    pub is_today: bool,
    pub is_blank: bool,
}

impl DayCell {
    pub fn blank() -> Self {
        Self {
            day_number: 0,
            is_today: false,
            is_blank: true,
        }
    }

    fn day(day_number: u32, is_today: bool) -> Self {
        Self {
            day_number,
            is_today,
            is_blank: false,
        }
    }
}

/// Build the cells for `(month, year)`.
///
/// `today` is a `(day, month, year)` lunar triple; the matching cell is flagged
/// when it falls inside the requested month.
pub fn month_grid(
    calendar: &dyn CalendarSystem,
    month: u32,
    year: i32,
    today: Option<(u32, u32, i32)>,
) -> Vec<DayCell> {
    let leading = calendar
        .month_start(month, year)
        .weekday()
        .num_days_from_sunday() as usize;
    let total = calendar.days_in_month(month, year);

    let today_in_month = today
        .filter(|(_, m, y)| *m == month && *y == year)
        .map(|(d, _, _)| d);

    let mut cells = Vec::with_capacity(leading + total as usize);
    cells.extend(std::iter::repeat_n(DayCell::blank(), leading));
    cells.extend((1..=total).map(|day| DayCell::day(day, today_in_month == Some(day))));
    cells.truncate(GRID_CELLS);
    cells
}

/// Extend `cells` with trailing blanks up to [`GRID_CELLS`].
pub fn pad_grid(mut cells: Vec<DayCell>) -> Vec<DayCell> {
    if cells.len() < GRID_CELLS {
        cells.resize(GRID_CELLS, DayCell::blank());
    }
    cells
}
