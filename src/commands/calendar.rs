//! `noor calendar`: the Hijri month grid, Sunday first.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use super::{converter, load_config, now_in, prepare, print_json};
use crate::args::GlobalOptions;
use crate::calendar::{CalendarConverter, DayCell, month_name, pad_grid};

const WEEKDAY_HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

#[derive(Debug, Serialize)]
struct CalendarReport {
    month: u32,
    year: i32,
    month_name: &'static str,
    days_in_month: u32,
    first_day: NaiveDate,
    cells: Vec<DayCell>,
}

pub fn handle_calendar_command(
    options: &GlobalOptions,
    month: Option<u32>,
    year: Option<i32>,
    json: bool,
) -> Result<()> {
    prepare(options, json)?;
    let config = load_config()?;

    match config.timezone() {
        Some(zone) => show_calendar(zone, month, year, json),
        None => show_calendar(Local, month, year, json),
    }
}

fn show_calendar<Z>(zone: Z, month: Option<u32>, year: Option<i32>, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let converter = converter(zone.clone());
    let now = now_in(&zone);
    let report = calendar_report(&converter, &now, month, year);

    if json {
        return print_json(&report);
    }

    log_version!();
    log_block_start!(
        "{} {} AH ({} days, from {})",
        report.month_name,
        report.year,
        report.days_in_month,
        report.first_day.format("%-d %B %Y")
    );
    log_pipe!();
    log_indented!("{}", WEEKDAY_HEADER);
    for row in grid_rows(&report.cells) {
        log_indented!("{}", row);
    }
    log_end!();
    Ok(())
}

/// Missing month or year default to today's.
fn calendar_report<Z: TimeZone>(
    converter: &CalendarConverter<Z>,
    now: &DateTime<Z>,
    month: Option<u32>,
    year: Option<i32>,
) -> CalendarReport {
    let today = converter.gregorian_to_lunar(now);
    let month = month.unwrap_or(today.month);
    let year = year.unwrap_or(today.year);

    CalendarReport {
        month,
        year,
        month_name: month_name(month),
        days_in_month: converter.days_in_lunar_month(month, year),
        first_day: converter.calendar().month_start(month, year),
        cells: converter.month_grid(month, year, now),
    }
}

/// Lay the cells out seven to a row. Today is bracketed.
fn grid_rows(cells: &[DayCell]) -> Vec<String> {
    let padded = pad_grid(cells.to_vec());
    let last_row = cells.len().div_ceil(7);

    padded
        .chunks(7)
        .take(last_row)
        .map(|week| {
            week.iter()
                .map(|cell| match (cell.is_blank, cell.is_today) {
                    (true, _) => "    ".to_string(),
                    (false, true) => format!("[{:>2}]", cell.day_number),
                    (false, false) => format!(" {:>2} ", cell.day_number),
                })
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn display_help() {
    log_version!();
    log_block_start!("calendar - Show a Hijri month grid");
    log_block_start!("Usage: noor calendar [--month <1-12>] [--year <AH>] [--json]");
    log_block_start!("Options:");
    log_indented!("-m, --month  Lunar month, the current one when omitted");
    log_indented!("-y, --year   Lunar year, the current one when omitted");
    log_indented!("--json       Print the grid cells as JSON");
    log_block_start!("Examples:");
    log_indented!("noor calendar");
    log_indented!("noor calendar --month 12 --year 1447");
    log_end!();
}
