//! Time source abstraction for real and pinned "now".
//!
//! Every renderer-facing query takes "now" as an argument, so the engines
//! themselves never read the clock. The binary reads it here: real system time
//! by default, or a fixed instant when `--at` is given, which makes one-shot
//! commands reproducible.

use chrono::{DateTime, Local, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::Arc;

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Whether "now" is pinned rather than read from the system clock.
    fn is_fixed(&self) -> bool;
}

/// Reads the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn is_fixed(&self) -> bool {
        false
    }
}

/// Always returns the same instant.
pub struct FixedTimeSource {
    instant: DateTime<Local>,
}

impl FixedTimeSource {
    pub fn new(instant: DateTime<Local>) -> Self {
        Self { instant }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.instant
    }

    fn is_fixed(&self) -> bool {
        true
    }
}

/// Install the process-wide time source. Only the first call wins.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

/// Handle to the installed source, for consumers that keep their own clock.
pub fn current() -> Arc<dyn TimeSource> {
    Arc::clone(source())
}

pub fn now() -> DateTime<Local> {
    source().now()
}

pub fn is_fixed() -> bool {
    source().is_fixed()
}

/// Parse `YYYY-MM-DD HH:MM:SS` in the local time zone.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    use chrono::NaiveDateTime;

    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| "Nonexistent local time (DST gap)".to_string())
}
