//! Command handlers for the noor binary.
//!
//! Each command lives in its own submodule. The helpers here are the pieces
//! they share: applying the global flags, picking the display zone and
//! formatting countdowns.

pub mod calendar;
pub mod help;
pub mod month;
pub mod run;
pub mod times;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::sync::Arc;

use crate::args::GlobalOptions;
use crate::calendar::{CalendarConverter, UmmAlQuraCalendar};
use crate::config::{self, Config, TimeFormat};
use crate::logger::Log;
use crate::time_source::{self, FixedTimeSource};

/// Apply the flags every command shares.
///
/// `quiet` turns log output off entirely, which `--json` needs so stdout
/// carries nothing but the document.
pub fn prepare(options: &GlobalOptions, quiet: bool) -> Result<()> {
    Log::set_debug(options.debug_enabled);
    if quiet {
        Log::set_enabled(false);
    }

    config::set_config_dir(options.config_dir.clone())?;

    if let Some(at) = options.at.as_deref() {
        let instant = time_source::parse_datetime(at)
            .map_err(anyhow::Error::msg)
            .context("Invalid --at value")?;
        time_source::init_time_source(Arc::new(FixedTimeSource::new(instant)));
        log_debug!("Using fixed time {}", instant.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}

/// Load the configuration for a one-shot command.
pub fn load_config() -> Result<Config> {
    config::load().context("Failed to load configuration")
}

/// Converter backed by the Umm al-Qura calendar.
pub fn converter<Z: TimeZone>(zone: Z) -> CalendarConverter<Z> {
    CalendarConverter::new(Arc::new(UmmAlQuraCalendar::new()), zone)
}

/// "Now" from the time source, in `zone`.
pub fn now_in<Z: TimeZone>(zone: &Z) -> DateTime<Z> {
    time_source::now().with_timezone(zone)
}

/// Pick the clock string matching the configured format.
pub fn clock<'a>(format: TimeFormat, formatted_12h: &'a str, formatted_24h: &'a str) -> &'a str {
    match format {
        TimeFormat::TwelveHour => formatted_12h,
        TimeFormat::TwentyFourHour => formatted_24h,
    }
}

/// `2h 05m`, or `12m` under an hour.
pub fn format_countdown(minutes: i64) -> String {
    let minutes = minutes.max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
