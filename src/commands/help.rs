//! Help command implementation.
//!
//! `noor help` lists the commands; `noor help <command>` shows the detailed
//! page each command module provides.

use anyhow::Result;

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("times") | Some("t") => super::times::display_help(),
        Some("month") | Some("m") => super::month::display_help(),
        Some("calendar") | Some("c") => super::calendar::display_help(),
        Some("run") | Some("r") => super::run::display_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("times, t [--json]        Today's prayer times and the next prayer");
    log_indented!("month, m [--json]        Hijri date and target-month countdown");
    log_indented!("calendar, c [--json]     Hijri month grid");
    log_indented!("run, r [--log <file>]    Keep running and refresh on schedule");
    log_indented!("help [COMMAND]           Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'noor help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'noor --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: noor help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("noor help");
    log_indented!("noor help calendar");
    log_end!();
}
