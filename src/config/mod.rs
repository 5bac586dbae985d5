//! Configuration for noor.
//!
//! Settings live in `noor.toml` under `$XDG_CONFIG_HOME/noor/` (or the
//! directory given with `--config`). A commented default file is written on
//! first load. Every field is optional:
//!
//! ```toml
//! #[Location]
//! latitude = 21.4225            # Latitude in degrees (-90 to 90)
//! longitude = 39.8262           # Longitude in degrees (-180 to 180)
//! city = "Mecca"                # Label shown next to the times
//! timezone = "Asia/Riyadh"      # IANA zone; the system zone when unset
//!
//! #[Calculation]
//! method = "umm_al_qura"        # muslim_world_league, egyptian, karachi, ...
//! madhab = "shafi"              # shafi or hanafi (affects Asr)
//! high_latitude_rule = "middle_of_the_night"
//!
//! #[Display]
//! time_format = "12h"           # 12h or 24h
//! target_month = 9              # Lunar month to count down to (1-12)
//!
//! #[Refresh]
//! periodic_interval = 900       # Coarse refresh in seconds (300-86400)
//! minute_interval = 60          # Fine refresh in seconds (30-90)
//! ```
//!
//! Out-of-range numbers, unknown time zones and bad time formats are
//! rejected when loading. Unknown method, madhab or high-latitude names only
//! produce a warning and fall back to the defaults.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::constants::*;
use crate::prayer::{CalculationParams, Coordinates};
use crate::scheduler::CadencePeriods;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    TwelveHour,
    TwentyFourHour,
}

impl TimeFormat {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "12h" | "12" => Some(TimeFormat::TwelveHour),
            "24h" | "24" => Some(TimeFormat::TwentyFourHour),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub timezone: Option<String>, // IANA name, e.g. "Europe/London"

    pub method: Option<String>,
    pub madhab: Option<String>,
    pub high_latitude_rule: Option<String>,

    pub time_format: Option<String>, // "12h" or "24h"
    pub target_month: Option<u32>,   // 1-12

    pub periodic_interval: Option<u64>, // seconds
    pub minute_interval: Option<u64>,   // seconds
}

impl Config {
    /// Configured coordinates, or `None` when either half is missing.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => None,
        }
    }

    /// Whether times are for a real configured location rather than the
    /// fallback.
    pub fn has_location(&self) -> bool {
        self.coordinates().is_some()
    }

    pub fn city(&self) -> &str {
        match (&self.city, self.has_location()) {
            (Some(city), _) => city,
            (None, true) => "Custom location",
            (None, false) => FALLBACK_CITY,
        }
    }

    pub fn calculation_params(&self) -> CalculationParams {
        CalculationParams::from_ids(
            self.method.as_deref(),
            self.madhab.as_deref(),
            self.high_latitude_rule.as_deref(),
        )
    }

    /// Named time zone. `None` means the system zone. Names are checked at
    /// load time, so an unparseable name here is treated as unset.
    pub fn timezone(&self) -> Option<Tz> {
        self.timezone.as_deref().and_then(|name| name.parse().ok())
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
            .as_deref()
            .and_then(TimeFormat::from_id)
            .unwrap_or(TimeFormat::TwelveHour)
    }

    pub fn target_month(&self) -> u32 {
        self.target_month.unwrap_or(DEFAULT_TARGET_MONTH)
    }

    pub fn cadence_periods(&self) -> CadencePeriods {
        CadencePeriods {
            periodic: Duration::from_secs(
                self.periodic_interval.unwrap_or(DEFAULT_PERIODIC_INTERVAL),
            ),
            minute: Duration::from_secs(self.minute_interval.unwrap_or(DEFAULT_MINUTE_INTERVAL)),
        }
    }

    /// Print the effective settings in the block log style.
    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        match self.coordinates() {
            Some(c) => {
                let lat_dir = if c.latitude >= 0.0 { "N" } else { "S" };
                let lon_dir = if c.longitude >= 0.0 { "E" } else { "W" };
                log_indented!(
                    "Location: {} ({:.4}°{}, {:.4}°{})",
                    self.city(),
                    c.latitude.abs(),
                    lat_dir,
                    c.longitude.abs(),
                    lon_dir
                );
            }
            None => log_indented!("Location: not set, using {}", FALLBACK_CITY),
        }

        log_indented!("Calculation: {}", self.calculation_params());
        log_indented!(
            "Time zone: {}",
            self.timezone.as_deref().unwrap_or("system")
        );

        let periods = self.cadence_periods();
        log_indented!(
            "Refresh: every {}s, minute ticks every {}s",
            periods.periodic.as_secs(),
            periods.minute.as_secs()
        );
    }
}
