//! # noor
//!
//! Hijri calendar, prayer-time and refresh-scheduling engine behind the
//! `noor` binary, exposed as a library so the internals can be tested and
//! embedded by other renderers.
//!
//! ## Architecture
//!
//! - **Calendar**: `calendar` converts Gregorian instants to Hijri dates and
//!   lays out month grids
//! - **Phase**: `phase` classifies "now" against a target lunar month
//! - **Prayer times**: `prayer` computes the six daily events, the current one
//!   and a countdown to the next
//! - **Scheduling**: `scheduler` runs the periodic and per-minute refresh
//!   cadences shared by consumer groups
//! - **Configuration**: `config` for TOML settings with hot reload
//! - **Commands**: `commands` for the CLI (`times`, `month`, `calendar`, `run`)
//! - **Infrastructure**: signal handling, the time source and logging
//!
//! The engines never read the clock or touch global state; "now" is always
//! passed in. Only the scheduler owns mutable shared state.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod calendar;
pub mod commands;
pub mod common;
pub mod config;
pub mod phase;
pub mod prayer;
pub mod scheduler;
pub mod signals;
pub mod time_source;
