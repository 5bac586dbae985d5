//! Configuration validation.
//!
//! Hard errors for values that would make the computations meaningless;
//! calculation identifiers are left to `CalculationParams::from_ids`, which
//! falls back with a warning.

use anyhow::Result;
use chrono_tz::Tz;

use super::{Config, TimeFormat};
use crate::common::constants::*;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if config.latitude.is_some() != config.longitude.is_some() {
        anyhow::bail!("latitude and longitude must be set together");
    }

    if let Some(name) = config.timezone.as_deref()
        && name.parse::<Tz>().is_err()
    {
        anyhow::bail!(
            "timezone '{}' is not a known IANA time zone (e.g. \"Asia/Riyadh\")",
            name
        );
    }

    if let Some(format) = config.time_format.as_deref()
        && TimeFormat::from_id(format).is_none()
    {
        anyhow::bail!("time_format must be \"12h\" or \"24h\" (got \"{}\")", format);
    }

    if let Some(month) = config.target_month
        && !(1..=12).contains(&month)
    {
        anyhow::bail!("target_month must be between 1 and 12 (got {})", month);
    }

    if let Some(interval) = config.periodic_interval
        && !(MINIMUM_PERIODIC_INTERVAL..=MAXIMUM_PERIODIC_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "periodic_interval ({} s) must be between {} and {} seconds",
            interval,
            MINIMUM_PERIODIC_INTERVAL,
            MAXIMUM_PERIODIC_INTERVAL
        );
    }

    if let Some(interval) = config.minute_interval
        && !(MINIMUM_MINUTE_INTERVAL..=MAXIMUM_MINUTE_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "minute_interval ({} s) must be between {} and {} seconds",
            interval,
            MINIMUM_MINUTE_INTERVAL,
            MAXIMUM_MINUTE_INTERVAL
        );
    }

    Ok(())
}
