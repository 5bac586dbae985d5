//! `noor run`: long-running refresh mode.
//!
//! Two consumer groups share one scheduler. `prayer` registers both cadences
//! so its countdown moves every minute; `month` only needs the periodic one.
//! Every refresh recomputes from the time source, so a missed or duplicated
//! tick never leaves stale output behind.
//!
//! Registrations are not persisted. Startup and every scheduler rebuild go
//! through [`start_scheduler`], which binds and registers both groups before
//! the first refresh.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};

use super::month::log_phase_status;
use super::times::{describe_next, log_daily_events};
use super::{converter, load_config, prepare};
use crate::args::GlobalOptions;
use crate::calendar::CalendarConverter;
use crate::common::constants::{MONTH_GROUP, PRAYER_GROUP};
use crate::config::{self, Config, TimeFormat, start_config_watcher};
use crate::logger::Log;
use crate::phase::{LunarPhaseEngine, LunarPhaseStatus, detect_phase_change, log_phase_change};
use crate::prayer::{
    CalculationParams, Coordinates, DailyEventSet, EventKind, PrayerTimeEngine,
};
use crate::scheduler::{Cadence, ConsumerGroupId, RefreshConsumer, RefreshScheduler};
use crate::signals::{SignalMessage, setup_signal_handler};
use crate::time_source::{self, TimeSource};

/// Cadences each group needs, registered once per group at startup.
const GROUP_CADENCES: [(&str, Cadence); 3] = [
    (PRAYER_GROUP, Cadence::Periodic),
    (PRAYER_GROUP, Cadence::Minute),
    (MONTH_GROUP, Cadence::Periodic),
];

pub fn handle_run_command(options: &GlobalOptions, log_file: Option<String>) -> Result<()> {
    prepare(options, false)?;

    let _log_guard = match log_file {
        Some(path) => Some(Log::start_file_logging(path).context("Failed to start file logging")?),
        None => None,
    };
    Log::set_timestamps(true);

    log_version!();
    if options.debug_enabled {
        log_pipe!();
        log_debug!("Debug mode enabled, showing scheduler activity");
    }

    let signal_state = setup_signal_handler()?;
    let mut config = load_config()?;
    config.log_config();

    let mut scheduler = start_scheduler(&config)?;

    match config::get_config_path() {
        Ok(path) => {
            if let Err(e) = start_config_watcher(signal_state.signal_sender.clone(), path) {
                log_warning!("Config hot reload unavailable: {e:#}");
            }
        }
        Err(e) => log_warning!("Config hot reload unavailable: {e:#}"),
    }

    while signal_state.is_running() {
        let Ok(message) = signal_state.signal_receiver.recv() else {
            break;
        };
        match message {
            SignalMessage::Refresh => {
                log_block_start!("Refresh requested");
                scheduler.trigger_immediate_refresh();
            }
            SignalMessage::Reload => reload(&mut scheduler, &mut config),
            SignalMessage::Shutdown => break,
        }
    }

    log_block_start!("Releasing refresh schedules...");
    scheduler.release_all();
    log_end!();
    Ok(())
}

/// Build a scheduler for `config`, bind both groups, register their
/// cadences and render once.
fn start_scheduler(config: &Config) -> Result<Arc<RefreshScheduler>> {
    let scheduler = RefreshScheduler::with_threads(config.cadence_periods());
    bind_consumers(&scheduler, config);

    if let Err(e) = register_cadences(&scheduler) {
        scheduler.release_all();
        return Err(e);
    }

    scheduler.trigger_immediate_refresh();
    Ok(scheduler)
}

fn register_cadences(scheduler: &RefreshScheduler) -> Result<()> {
    for (group, cadence) in GROUP_CADENCES {
        scheduler
            .register_cadence(&ConsumerGroupId::from(group), cadence)
            .with_context(|| format!("Failed to schedule {cadence} refresh for {group}"))?;
    }
    Ok(())
}

/// (Re)bind both renderers. Rebinding replaces the previous consumer and
/// leaves registrations untouched.
fn bind_consumers(scheduler: &RefreshScheduler, config: &Config) {
    match config.timezone() {
        Some(zone) => bind_in_zone(scheduler, config, zone),
        None => bind_in_zone(scheduler, config, Local),
    }
}

fn bind_in_zone<Z>(scheduler: &RefreshScheduler, config: &Config, zone: Z)
where
    Z: TimeZone + Send + Sync + 'static,
    Z::Offset: Display,
{
    scheduler.bind_consumer(
        &ConsumerGroupId::from(PRAYER_GROUP),
        Arc::new(PrayerRenderer::new(config, zone.clone())),
    );
    scheduler.bind_consumer(
        &ConsumerGroupId::from(MONTH_GROUP),
        Arc::new(MonthRenderer::new(config, zone)),
    );
}

fn reload(scheduler: &mut Arc<RefreshScheduler>, config: &mut Config) {
    log_block_start!("Reloading configuration...");

    let new_config = match config::load() {
        Ok(new_config) => new_config,
        Err(e) => {
            log_error!("{e:#}");
            log_indented!("Keeping the previous configuration");
            return;
        }
    };

    if new_config == *config {
        log_decorated!("Configuration unchanged");
        scheduler.trigger_immediate_refresh();
        return;
    }

    new_config.log_config();

    if new_config.cadence_periods() == scheduler.periods() {
        bind_consumers(scheduler, &new_config);
        scheduler.trigger_immediate_refresh();
    } else {
        // Periods are fixed per scheduler: start the replacement before
        // stopping the old one so a failure leaves refreshes running.
        match start_scheduler(&new_config) {
            Ok(replacement) => {
                scheduler.release_all();
                *scheduler = replacement;
            }
            Err(e) => {
                log_error!("{e:#}");
                log_indented!("Keeping the previous refresh schedule");
                return;
            }
        }
    }

    *config = new_config;
}

/// What the prayer renderer last showed. A refresh that changes nothing in
/// here prints nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PrayerSnapshot {
    date: NaiveDate,
    current: Option<EventKind>,
    next: Option<(EventKind, i64)>,
}

impl PrayerSnapshot {
    fn of(events: &DailyEventSet) -> Self {
        Self {
            date: events.reference_date,
            current: events.current_event,
            next: events
                .next_event
                .as_ref()
                .map(|next| (next.kind, next.countdown_minutes)),
        }
    }
}

struct PrayerRenderer<Z> {
    engine: PrayerTimeEngine,
    coordinates: Option<Coordinates>,
    params: CalculationParams,
    format: TimeFormat,
    zone: Z,
    clock: Arc<dyn TimeSource>,
    last: Mutex<Option<PrayerSnapshot>>,
}

impl<Z: TimeZone> PrayerRenderer<Z> {
    fn new(config: &Config, zone: Z) -> Self {
        Self {
            engine: PrayerTimeEngine::default(),
            coordinates: config.coordinates(),
            params: config.calculation_params(),
            format: config.time_format(),
            zone,
            clock: time_source::current(),
            last: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }
}

impl<Z> RefreshConsumer for PrayerRenderer<Z>
where
    Z: TimeZone + Send + Sync,
    Z::Offset: Display,
{
    fn on_refresh(&self) -> Result<()> {
        let now = self.clock.now().with_timezone(&self.zone);
        let events = self
            .engine
            .daily_events(self.coordinates, &now, &self.params);
        let snapshot = PrayerSnapshot::of(&events);

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match last.as_ref() {
            Some(previous) if *previous == snapshot => {}
            Some(previous) if previous.date == snapshot.date && previous.current == snapshot.current => {
                if let Some(next) = &events.next_event {
                    log_decorated!("{}", describe_next(next, self.format));
                }
            }
            Some(previous) if previous.date == snapshot.date => {
                if let Some(kind) = snapshot.current {
                    log_block_start!("It is now {} time", kind.display_name());
                }
                if let Some(next) = &events.next_event {
                    log_decorated!("{}", describe_next(next, self.format));
                }
            }
            _ => {
                log_block_start!("Prayer times for {}", now.format("%A %-d %B %Y"));
                log_daily_events(&events, self.format);
            }
        }
        *last = Some(snapshot);
        Ok(())
    }
}

struct MonthRenderer<Z: TimeZone> {
    engine: LunarPhaseEngine,
    converter: CalendarConverter<Z>,
    clock: Arc<dyn TimeSource>,
    last: Mutex<Option<LunarPhaseStatus>>,
}

impl<Z: TimeZone> MonthRenderer<Z> {
    fn new(config: &Config, zone: Z) -> Self {
        Self {
            engine: LunarPhaseEngine::new(config.target_month()),
            converter: converter(zone),
            clock: time_source::current(),
            last: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }
}

impl<Z> RefreshConsumer for MonthRenderer<Z>
where
    Z: TimeZone + Send + Sync,
{
    fn on_refresh(&self) -> Result<()> {
        let now = self.clock.now().with_timezone(self.converter.zone());
        let status = self.engine.status(&self.converter, &now);
        let target = self.engine.target_month();

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match last.as_ref() {
            Some(previous) => log_phase_change(&detect_phase_change(previous, &status), target),
            None => {
                log_block_start!(
                    "Today is {}",
                    self.converter.gregorian_to_lunar(&now).formatted()
                );
                log_phase_status(&status, target);
            }
        }
        *last = Some(status);
        Ok(())
    }
}

pub fn display_help() {
    log_version!();
    log_block_start!("run - Keep running and refresh on schedule");
    log_block_start!("Usage: noor run [--log <file>]");
    log_block_start!("Options:");
    log_indented!("--log <file>  Write output to a file instead of the terminal");
    log_block_start!("Description:");
    log_indented!("Prints the prayer times and the target-month countdown, then");
    log_indented!("updates them every minute and every periodic_interval seconds.");
    log_indented!("Changes to noor.toml are picked up automatically.");
    log_block_start!("Signals:");
    log_indented!("SIGUSR1                  Refresh now");
    log_indented!("SIGUSR2                  Reload configuration");
    log_indented!("SIGINT, SIGTERM, SIGHUP  Stop");
    log_end!();
}
