//! Default configuration file generation.
//!
//! The builder aligns the trailing comments of every setting into one column.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Write a commented default `noor.toml` at `path`, creating parent
/// directories. Location keys are written commented out so the fallback
/// location applies until the user sets one.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}

pub(crate) fn default_config_content() -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Location")
        .add_commented_setting(
            "latitude",
            &format!("{FALLBACK_LATITUDE}"),
            "Latitude in degrees (-90 to 90)",
        )
        .add_commented_setting(
            "longitude",
            &format!("{FALLBACK_LONGITUDE}"),
            "Longitude in degrees (-180 to 180)",
        )
        .add_commented_setting("city", &format!("\"{FALLBACK_CITY}\""), "Label shown next to the times")
        .add_commented_setting(
            "timezone",
            "\"Asia/Riyadh\"",
            "IANA time zone; the system zone when unset",
        )
        .add_section("Calculation")
        .add_setting(
            "method",
            &format!("\"{DEFAULT_METHOD}\""),
            "muslim_world_league, egyptian, karachi, umm_al_qura, dubai, north_america, kuwait, qatar, singapore, moon_sighting",
        )
        .add_setting(
            "madhab",
            &format!("\"{DEFAULT_MADHAB}\""),
            "shafi or hanafi (affects Asr)",
        )
        .add_setting(
            "high_latitude_rule",
            &format!("\"{DEFAULT_HIGH_LATITUDE_RULE}\""),
            "none, middle_of_the_night, seventh_of_the_night, twilight_angle",
        )
        .add_section("Display")
        .add_setting(
            "time_format",
            &format!("\"{DEFAULT_TIME_FORMAT}\""),
            "12h or 24h",
        )
        .add_setting(
            "target_month",
            &DEFAULT_TARGET_MONTH.to_string(),
            "Lunar month to count down to (1-12)",
        )
        .add_section("Refresh")
        .add_setting(
            "periodic_interval",
            &DEFAULT_PERIODIC_INTERVAL.to_string(),
            &format!(
                "Coarse refresh in seconds ({MINIMUM_PERIODIC_INTERVAL}-{MAXIMUM_PERIODIC_INTERVAL})"
            ),
        )
        .add_setting(
            "minute_interval",
            &DEFAULT_MINUTE_INTERVAL.to_string(),
            &format!(
                "Fine refresh in seconds ({MINIMUM_MINUTE_INTERVAL}-{MAXIMUM_MINUTE_INTERVAL})"
            ),
        )
        .build();
    content.push('\n');
    content
}

struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(Entry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("# {key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                Entry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Section(title) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(title);
                }
                Entry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
