//! Binary entry point.
//!
//! Parses the command line and hands off to the matching handler in
//! `commands`. Handlers return `anyhow::Result`; an error is printed with its
//! context chain and turned into a non-zero exit status.

use noor::args::{self, CliAction, ParsedArgs};
use noor::commands;
use noor::common::constants::EXIT_FAILURE;
use noor::logger::Log;

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Times { options, json } => commands::times::handle_times_command(&options, json),
        CliAction::Month { options, json } => commands::month::handle_month_command(&options, json),
        CliAction::Calendar {
            options,
            month,
            year,
            json,
        } => commands::calendar::handle_calendar_command(&options, month, year, json),
        CliAction::Run { options, log_file } => {
            commands::run::handle_run_command(&options, log_file)
        }
    };

    if let Err(e) = result {
        // --json silences the logger; errors must still reach the terminal.
        Log::set_enabled(true);
        noor::log_error_standalone!("{e:#}");
        std::process::exit(EXIT_FAILURE);
    }
}
