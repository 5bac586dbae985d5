//! `noor times`: today's events, the current event and the next one.

use anyhow::Result;
use chrono::{Local, TimeZone};
use std::fmt::Display;

use super::{clock, converter, format_countdown, load_config, now_in, prepare, print_json};
use crate::args::GlobalOptions;
use crate::config::{Config, TimeFormat};
use crate::prayer::{DailyEventSet, EventKind, NextEventInfo, PrayerTimeEngine};

pub fn handle_times_command(options: &GlobalOptions, json: bool) -> Result<()> {
    prepare(options, json)?;
    let config = load_config()?;

    match config.timezone() {
        Some(zone) => show_times(&config, zone, json),
        None => show_times(&config, Local, json),
    }
}

fn show_times<Z>(config: &Config, zone: Z, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let now = now_in(&zone);
    let events = PrayerTimeEngine::default().daily_events(
        config.coordinates(),
        &now,
        &config.calculation_params(),
    );

    if json {
        return print_json(&events);
    }

    let hijri = converter(zone).gregorian_to_lunar(&now);

    log_version!();
    if !config.has_location() {
        log_pipe!();
        log_warning!("No location configured, showing times for {}", config.city());
        log_indented!("Set latitude and longitude in noor.toml");
    }
    log_block_start!(
        "{}, {} ({})",
        config.city(),
        now.format("%A %-d %B %Y"),
        hijri.formatted()
    );
    log_indented!("{}", config.calculation_params());

    log_daily_events(&events, config.time_format());
    log_end!();
    Ok(())
}

/// The event table followed by the next-event summary.
pub fn log_daily_events(events: &DailyEventSet, format: TimeFormat) {
    if events.is_empty() {
        log_pipe!();
        log_warning!("No prayer times can be computed for this date and location");
        return;
    }

    log_pipe!();
    for event in &events.ordered_events {
        let marker = if events.current_event == Some(event.kind) {
            "  ◂ now"
        } else {
            ""
        };
        log_indented!(
            "{:<8} {:>8}{}",
            event.kind.display_name(),
            clock(format, &event.formatted_12h, &event.formatted_24h),
            marker
        );
    }

    if events.ordered_events.len() < EventKind::ALL.len() {
        log_pipe!();
        log_warning!("Some events do not occur at this latitude today");
        log_indented!("A high_latitude_rule other than \"none\" can place Fajr and Isha");
    }

    if let Some(next) = &events.next_event {
        log_block_start!("{}", describe_next(next, format));
    }
}

/// `Next: Asr at 3:53 PM, in 1h 12m (45% of the wait)`
pub fn describe_next(next: &NextEventInfo, format: TimeFormat) -> String {
    format!(
        "Next: {} {}at {}, in {} ({:.0}% of the wait)",
        next.kind.display_name(),
        if next.is_tomorrow { "tomorrow " } else { "" },
        clock(format, &next.formatted_12h, &next.formatted_24h),
        format_countdown(next.countdown_minutes),
        next.progress() * 100.0
    )
}

pub fn display_help() {
    log_version!();
    log_block_start!("times - Show today's prayer times");
    log_block_start!("Usage: noor times [--json]");
    log_block_start!("Options:");
    log_indented!("--json     Print the full event set as JSON");
    log_block_start!("Description:");
    log_indented!("Lists Fajr, Sunrise, Dhuhr, Asr, Maghrib and Isha for today at the");
    log_indented!("configured location, marks the current prayer and counts down to");
    log_indented!("the next one. After Isha the countdown points at tomorrow's Fajr.");
    log_block_start!("Examples:");
    log_indented!("noor times");
    log_indented!("noor --at \"2026-02-18 21:05:00\" times --json");
    log_end!();
}
