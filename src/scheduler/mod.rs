//! Dual-cadence refresh scheduler shared by independent consumer groups.
//!
//! Each consumer group registers the cadences it needs. Registrations are
//! reference counted per `(group, cadence)` pair, and a cadence's recurring
//! trigger runs exactly while the sum of its refcounts across all groups is
//! positive. Tearing down one group therefore never stops a cadence another
//! group still depends on.
//!
//! The registration table is the only mutable shared state. Every operation
//! on it takes a single mutex; refresh delivery snapshots the consumers under
//! the lock and signals them after releasing it, so a slow or failing
//! consumer cannot stall registration or other deliveries.
//!
//! Nothing is persisted. After a restart the bootstrap code must register
//! the cadences of every live group again before relying on ticks.

pub mod trigger;

pub use trigger::{FireCallback, RecurringTrigger, ThreadTrigger};

use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::common::constants::{DEFAULT_MINUTE_INTERVAL, DEFAULT_PERIODIC_INTERVAL};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Coarse refresh, roughly every fifteen minutes.
    Periodic,
    /// Fine refresh, roughly once a minute.
    Minute,
}

impl Cadence {
    pub const ALL: [Cadence; 2] = [Cadence::Periodic, Cadence::Minute];

    pub fn name(&self) -> &'static str {
        match self {
            Cadence::Periodic => "periodic",
            Cadence::Minute => "minute",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConsumerGroupId(String);

impl ConsumerGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConsumerGroupId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ConsumerGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receives the payload-free refresh signal for one consumer group.
pub trait RefreshConsumer: Send + Sync {
    fn on_refresh(&self) -> Result<()>;
}

impl<F> RefreshConsumer for F
where
    F: Fn() -> Result<()> + Send + Sync,
{
    fn on_refresh(&self) -> Result<()> {
        self()
    }
}

/// Period of each cadence's recurring trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadencePeriods {
    pub periodic: Duration,
    pub minute: Duration,
}

impl Default for CadencePeriods {
    fn default() -> Self {
        Self {
            periodic: Duration::from_secs(DEFAULT_PERIODIC_INTERVAL),
            minute: Duration::from_secs(DEFAULT_MINUTE_INTERVAL),
        }
    }
}

impl CadencePeriods {
    pub fn period(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Periodic => self.periodic,
            Cadence::Minute => self.minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CadenceRegistration {
    pub group: ConsumerGroupId,
    pub cadence: Cadence,
    pub refcount: u32,
}

/// Outcome of a deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deregistration {
    /// The group still holds the cadence.
    Decremented { remaining: u32 },
    /// The group's last registration is gone. `cadence_cancelled` is set when
    /// no other group held the cadence either.
    Released { cadence_cancelled: bool },
    /// There was nothing to deregister. The count stays at zero.
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub group: ConsumerGroupId,
    pub message: String,
}

/// Result of one fan-out of the refresh signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireReport {
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl FireReport {
    /// A fire with failed deliveries is worth retrying.
    pub fn is_retryable(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Default)]
struct RegistrationTable {
    refcounts: BTreeMap<(ConsumerGroupId, Cadence), u32>,
    consumers: HashMap<ConsumerGroupId, Arc<dyn RefreshConsumer>>,
    active: BTreeSet<Cadence>,
}

impl RegistrationTable {
    fn total(&self, cadence: Cadence) -> u32 {
        self.refcounts
            .iter()
            .filter(|((_, c), _)| *c == cadence)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Consumers of every group matching `filter`, in group order.
    fn targets(
        &self,
        filter: impl Fn(&ConsumerGroupId, Cadence) -> bool,
    ) -> Vec<(ConsumerGroupId, Arc<dyn RefreshConsumer>)> {
        let groups: BTreeSet<&ConsumerGroupId> = self
            .refcounts
            .iter()
            .filter(|((group, cadence), count)| **count > 0 && filter(group, *cadence))
            .map(|((group, _), _)| group)
            .collect();

        groups
            .into_iter()
            .filter_map(|group| {
                self.consumers
                    .get(group)
                    .map(|consumer| (group.clone(), Arc::clone(consumer)))
            })
            .collect()
    }
}

pub struct RefreshScheduler {
    table: Mutex<RegistrationTable>,
    trigger: Arc<dyn RecurringTrigger>,
    periods: CadencePeriods,
    this: Weak<RefreshScheduler>,
}

impl RefreshScheduler {
    pub fn new(trigger: Arc<dyn RecurringTrigger>, periods: CadencePeriods) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            table: Mutex::new(RegistrationTable::default()),
            trigger,
            periods,
            this: this.clone(),
        })
    }

    /// Scheduler backed by [`ThreadTrigger`] with the given periods.
    pub fn with_threads(periods: CadencePeriods) -> Arc<Self> {
        Self::new(Arc::new(ThreadTrigger::new()), periods)
    }

    pub fn periods(&self) -> CadencePeriods {
        self.periods
    }

    /// Attach the signal sink for `group`, replacing any previous one.
    pub fn bind_consumer(&self, group: &ConsumerGroupId, consumer: Arc<dyn RefreshConsumer>) {
        self.lock().consumers.insert(group.clone(), consumer);
    }

    /// Increment `group`'s refcount for `cadence`, starting the cadence's
    /// trigger if this is its first holder. Returns the new refcount.
    pub fn register_cadence(&self, group: &ConsumerGroupId, cadence: Cadence) -> Result<u32> {
        let mut table = self.lock();

        if !table.active.contains(&cadence) {
            let period = self.periods.period(cadence);
            self.trigger
                .schedule_recurring(cadence, period, self.fire_callback(cadence))?;
            table.active.insert(cadence);
            log_debug!("Started {} cadence", cadence);
        }

        let count = table
            .refcounts
            .entry((group.clone(), cadence))
            .or_insert(0);
        *count += 1;
        let count = *count;

        log_debug!("{} registered {} cadence (refcount {})", group, cadence, count);
        Ok(count)
    }

    /// Decrement `group`'s refcount for `cadence`, cancelling the cadence's
    /// trigger once no group holds it. Never goes below zero.
    pub fn deregister_cadence(&self, group: &ConsumerGroupId, cadence: Cadence) -> Deregistration {
        let mut table = self.lock();
        let key = (group.clone(), cadence);

        let remaining = match table.refcounts.get_mut(&key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                *count
            }
            _ => {
                log_warning!(
                    "Unmatched deregistration of {} cadence for {}, ignoring",
                    cadence,
                    group
                );
                return Deregistration::Unmatched;
            }
        };

        if remaining > 0 {
            log_debug!("{} deregistered {} cadence (refcount {})", group, cadence, remaining);
            return Deregistration::Decremented { remaining };
        }

        table.refcounts.remove(&key);
        let cadence_cancelled = self.cancel_if_unused(&mut table, cadence);
        log_debug!("{} released {} cadence", group, cadence);
        Deregistration::Released { cadence_cancelled }
    }

    /// Drop every registration and the consumer binding of `group`. Returns
    /// the cadences whose triggers were cancelled as a result.
    pub fn release_group(&self, group: &ConsumerGroupId) -> Vec<Cadence> {
        let mut table = self.lock();

        let held: Vec<Cadence> = table
            .refcounts
            .keys()
            .filter(|(g, _)| g == group)
            .map(|(_, cadence)| *cadence)
            .collect();
        for cadence in &held {
            table.refcounts.remove(&(group.clone(), *cadence));
        }
        table.consumers.remove(group);

        let cancelled: Vec<Cadence> = held
            .into_iter()
            .filter(|cadence| self.cancel_if_unused(&mut table, *cadence))
            .collect();

        log_debug!("Released consumer group {}", group);
        cancelled
    }

    /// Release every group. Used at shutdown.
    pub fn release_all(&self) {
        let groups: BTreeSet<ConsumerGroupId> = {
            let table = self.lock();
            table
                .refcounts
                .keys()
                .map(|(group, _)| group.clone())
                .chain(table.consumers.keys().cloned())
                .collect()
        };
        for group in groups {
            self.release_group(&group);
        }
    }

    /// Signal every registered group now, whatever its cadences. Returns once
    /// every consumer has been called.
    pub fn trigger_immediate_refresh(&self) -> FireReport {
        let targets = self.lock().targets(|_, _| true);
        deliver(targets)
    }

    /// Signal the groups registered for `cadence`. A fire for a cadence that
    /// is no longer active delivers nothing.
    pub fn on_cadence_fire(&self, cadence: Cadence) -> FireReport {
        let targets = {
            let table = self.lock();
            if !table.active.contains(&cadence) {
                return FireReport::default();
            }
            table.targets(|_, c| c == cadence)
        };
        deliver(targets)
    }

    pub fn refcount(&self, group: &ConsumerGroupId, cadence: Cadence) -> u32 {
        self.lock()
            .refcounts
            .get(&(group.clone(), cadence))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_cadence_active(&self, cadence: Cadence) -> bool {
        self.lock().active.contains(&cadence)
    }

    pub fn registrations(&self) -> Vec<CadenceRegistration> {
        self.lock()
            .refcounts
            .iter()
            .map(|((group, cadence), refcount)| CadenceRegistration {
                group: group.clone(),
                cadence: *cadence,
                refcount: *refcount,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, RegistrationTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_if_unused(&self, table: &mut RegistrationTable, cadence: Cadence) -> bool {
        if table.total(cadence) > 0 || !table.active.remove(&cadence) {
            return false;
        }
        self.trigger.cancel_recurring(cadence);
        log_debug!("Stopped {} cadence", cadence);
        true
    }

    fn fire_callback(&self, cadence: Cadence) -> FireCallback {
        let scheduler = self.this.clone();
        Arc::new(move || {
            let Some(scheduler) = scheduler.upgrade() else {
                return;
            };
            let report = scheduler.on_cadence_fire(cadence);
            if report.is_retryable() {
                log_warning!(
                    "{} refresh had {} failed deliveries, retrying on next tick",
                    cadence,
                    report.failures.len()
                );
            }
        })
    }
}

/// Signal each target in turn. A failing or panicking consumer is logged and
/// recorded; the remaining targets are still signalled.
fn deliver(targets: Vec<(ConsumerGroupId, Arc<dyn RefreshConsumer>)>) -> FireReport {
    let mut report = FireReport::default();

    for (group, consumer) in targets {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| consumer.on_refresh()));
        let message = match outcome {
            Ok(Ok(())) => {
                report.delivered += 1;
                continue;
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(payload) => panic_message(payload.as_ref()),
        };

        log_error!("Refresh of {} failed: {}", group, message);
        report.failures.push(DeliveryFailure { group, message });
    }

    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
