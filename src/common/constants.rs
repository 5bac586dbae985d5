//! Application-wide defaults and limits.

// # Location

/// Fallback latitude used when no location is configured (Mecca).
pub const FALLBACK_LATITUDE: f64 = 21.4225;
/// Fallback longitude used when no location is configured (Mecca).
pub const FALLBACK_LONGITUDE: f64 = 39.8262;
pub const FALLBACK_CITY: &str = "Mecca";

// # Calendar

/// Ninth lunar month (Ramadan).
pub const DEFAULT_TARGET_MONTH: u32 = 9;

// # Calculation

pub const DEFAULT_METHOD: &str = "umm_al_qura";
pub const DEFAULT_MADHAB: &str = "shafi";
pub const DEFAULT_HIGH_LATITUDE_RULE: &str = "middle_of_the_night";
pub const DEFAULT_TIME_FORMAT: &str = "12h";

// # Refresh cadences (seconds)

pub const DEFAULT_PERIODIC_INTERVAL: u64 = 15 * 60;
pub const MINIMUM_PERIODIC_INTERVAL: u64 = 5 * 60;
pub const MAXIMUM_PERIODIC_INTERVAL: u64 = 24 * 60 * 60;

pub const DEFAULT_MINUTE_INTERVAL: u64 = 60;
pub const MINIMUM_MINUTE_INTERVAL: u64 = 30;
pub const MAXIMUM_MINUTE_INTERVAL: u64 = 90;

// # Consumer groups used by the run command

pub const PRAYER_GROUP: &str = "prayer";
pub const MONTH_GROUP: &str = "month";

// # Process

pub const EXIT_FAILURE: i32 = 1;

/// Debounce for config file change events.
pub const CONFIG_WATCH_DEBOUNCE_MS: u64 = 500;
