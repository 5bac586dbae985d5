//! `noor month`: today's Hijri date and where it stands relative to the
//! target month.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use super::{converter, load_config, now_in, prepare, print_json};
use crate::args::GlobalOptions;
use crate::calendar::{CalendarConverter, LunarDate, month_name};
use crate::config::Config;
use crate::phase::{LunarPhaseEngine, LunarPhaseStatus, Phase};

#[derive(Debug, Serialize)]
struct MonthReport {
    today: LunarDate,
    target_month: u32,
    target_month_name: &'static str,
    /// Gregorian first day of the occurrence `status` refers to.
    target_month_start: NaiveDate,
    status: LunarPhaseStatus,
}

pub fn handle_month_command(options: &GlobalOptions, json: bool) -> Result<()> {
    prepare(options, json)?;
    let config = load_config()?;

    match config.timezone() {
        Some(zone) => show_month(&config, zone, json),
        None => show_month(&config, Local, json),
    }
}

fn show_month<Z>(config: &Config, zone: Z, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let converter = converter(zone.clone());
    let now = now_in(&zone);
    let engine = LunarPhaseEngine::new(config.target_month());

    let report = month_report(&converter, &engine, &now);
    if json {
        return print_json(&report);
    }

    log_version!();
    log_block_start!(
        "Today is {} ({})",
        report.today.formatted(),
        now.format("%A %-d %B %Y")
    );
    log_phase_status(&report.status, engine.target_month());
    log_indented!(
        "{} {} has {} days, starting {}",
        report.target_month_name,
        report.status.target_month_year,
        report.status.total_days_in_target_month,
        report.target_month_start.format("%A %-d %B %Y")
    );
    log_end!();
    Ok(())
}

fn month_report<Z: TimeZone>(
    converter: &CalendarConverter<Z>,
    engine: &LunarPhaseEngine,
    now: &DateTime<Z>,
) -> MonthReport {
    let status = engine.status(converter, now);
    let target_month = engine.target_month();
    MonthReport {
        today: converter.gregorian_to_lunar(now),
        target_month,
        target_month_name: month_name(target_month),
        target_month_start: converter
            .lunar_month_start(target_month, status.target_month_year)
            .date_naive(),
        status,
    }
}

/// One block describing `status`, shared with the run mode's first render.
pub fn log_phase_status(status: &LunarPhaseStatus, target_month: u32) {
    let name = month_name(target_month);
    match status.phase {
        Phase::During => log_block_start!(
            "{} {}, day {} of {}",
            name,
            status.target_month_year,
            status.current_day_in_target_month,
            status.total_days_in_target_month
        ),
        Phase::Pre | Phase::Post => log_block_start!(
            "{} {} until {} {}",
            status.days_until_target_month,
            if status.days_until_target_month == 1 {
                "day"
            } else {
                "days"
            },
            name,
            status.target_month_year
        ),
    }
}

pub fn display_help() {
    log_version!();
    log_block_start!("month - Show the Hijri date and target-month countdown");
    log_block_start!("Usage: noor month [--json]");
    log_block_start!("Description:");
    log_indented!("Prints today's Hijri date, then either the day of the target month");
    log_indented!("(target_month in noor.toml, Ramadan by default) or the number of");
    log_indented!("days until it next begins.");
    log_end!();
}
