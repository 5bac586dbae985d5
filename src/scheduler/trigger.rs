//! Recurring trigger capability and a thread-backed implementation.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::Cadence;

/// Callback invoked on every tick of a recurring trigger.
pub type FireCallback = Arc<dyn Fn() + Send + Sync>;

/// Platform timer the scheduler drives. At most one trigger per cadence is
/// live; scheduling a cadence again replaces the previous trigger.
pub trait RecurringTrigger: Send + Sync {
    fn schedule_recurring(&self, cadence: Cadence, period: Duration, on_fire: FireCallback)
    -> Result<()>;

    /// Stop a cadence. Cancelling a cadence that is not scheduled is a no-op.
    fn cancel_recurring(&self, cadence: Cadence);
}

/// One timer thread per scheduled cadence.
///
/// Each thread sleeps on a channel with a timeout equal to the period and
/// fires on timeout. Dropping the sender wakes the thread and ends it, so
/// cancellation never waits for a callback in progress.
#[derive(Default)]
pub struct ThreadTrigger {
    timers: Mutex<HashMap<Cadence, Sender<()>>>,
}

impl ThreadTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self, cadence: Cadence) -> bool {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&cadence)
    }
}

impl RecurringTrigger for ThreadTrigger {
    fn schedule_recurring(
        &self,
        cadence: Cadence,
        period: Duration,
        on_fire: FireCallback,
    ) -> Result<()> {
        let (tx, rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name(format!("noor-{}-timer", cadence.name()))
            .spawn(move || {
                loop {
                    match rx.recv_timeout(next_wait(cadence, period)) {
                        Err(RecvTimeoutError::Timeout) => on_fire(),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .with_context(|| format!("Failed to spawn {} timer thread", cadence.name()))?;

        // Replacing the sender disconnects any previous timer for this cadence.
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cadence, tx);

        log_debug!("{} timer started ({}s)", cadence.name(), period.as_secs());
        Ok(())
    }

    fn cancel_recurring(&self, cadence: Cadence) {
        let removed = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&cadence);
        if removed.is_some() {
            log_debug!("{} timer cancelled", cadence.name());
        }
    }
}

/// Wait before the next tick. Minute ticks land on wall-clock minute
/// boundaries when the period is a whole number of minutes.
fn next_wait(cadence: Cadence, period: Duration) -> Duration {
    if cadence != Cadence::Minute || period.as_secs() % 60 != 0 || period.is_zero() {
        return period;
    }
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let into_minute = Duration::from_millis((since_epoch.as_millis() % 60_000) as u64);
    let until_boundary = Duration::from_secs(60) - into_minute;
    until_boundary.min(period)
}
