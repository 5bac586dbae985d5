//! Command-line argument parsing.
//!
//! Global flags may appear anywhere on the line, before or after the command.
//! The first bare word names the command; without one, `times` is assumed.
//! Flags that only make sense for one command are rejected elsewhere so that
//! typos surface as usage errors instead of being silently ignored.

use std::iter::Peekable;

/// Flags shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
    /// Fixed "now" as `YYYY-MM-DD HH:MM:SS`
    pub at: Option<String>,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Today's events with the current and next event
    Times { options: GlobalOptions, json: bool },
    /// Current Hijri date and target-month phase
    Month { options: GlobalOptions, json: bool },
    /// Hijri month grid, the current month unless given
    Calendar {
        options: GlobalOptions,
        month: Option<u32>,
        year: Option<i32>,
        json: bool,
    },
    /// Long-running refresh mode
    Run {
        options: GlobalOptions,
        log_file: Option<String>,
    },
    /// `noor help [COMMAND]`
    Help { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or misused arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

/// Everything collected in the single pass over the arguments.
#[derive(Default)]
struct RawArgs {
    options: GlobalOptions,
    json: bool,
    month: Option<u32>,
    year: Option<i32>,
    log_file: Option<String>,
    display_help: bool,
    display_version: bool,
    unknown_arg_found: bool,
    positionals: Vec<String>,
}

impl ParsedArgs {
    /// Parse command-line arguments, program name first.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let raw = collect(&args_vec);

        // Version and help win over everything else, including errors.
        let action = if raw.display_version {
            CliAction::ShowVersion
        } else if raw.display_help {
            CliAction::ShowHelp
        } else if raw.unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            resolve_command(raw)
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn collect(args_vec: &[String]) -> RawArgs {
    let mut raw = RawArgs::default();
    let mut iter = args_vec.iter().peekable();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => raw.display_help = true,
            "--version" | "-V" | "-v" => raw.display_version = true,
            "--debug" | "-d" => raw.options.debug_enabled = true,
            "--json" | "-j" => raw.json = true,
            "--config" | "-c" => match take_value(&mut iter, "--config", "<directory>") {
                Some(dir) => raw.options.config_dir = Some(dir),
                None => raw.unknown_arg_found = true,
            },
            "--at" => match take_value(&mut iter, "--at", "\"YYYY-MM-DD HH:MM:SS\"") {
                Some(at) => raw.options.at = Some(at),
                None => raw.unknown_arg_found = true,
            },
            "--log" => match take_value(&mut iter, "--log", "<file>") {
                Some(file) => raw.log_file = Some(file),
                None => raw.unknown_arg_found = true,
            },
            "--month" | "-m" => {
                match take_value(&mut iter, "--month", "<1-12>").and_then(|v| parse_month(&v)) {
                    Some(month) => raw.month = Some(month),
                    None => raw.unknown_arg_found = true,
                }
            }
            "--year" | "-y" => {
                match take_value(&mut iter, "--year", "<year AH>").and_then(|v| parse_year(&v)) {
                    Some(year) => raw.year = Some(year),
                    None => raw.unknown_arg_found = true,
                }
            }
            other if other.starts_with('-') => {
                log_warning_standalone!("Unknown option: {}", other);
                raw.unknown_arg_found = true;
            }
            _ => raw.positionals.push(arg.clone()),
        }
    }

    raw
}

/// Consume the value following `flag`. A following flag does not count.
fn take_value<'a, I>(iter: &mut Peekable<I>, flag: &str, usage: &str) -> Option<String>
where
    I: Iterator<Item = &'a String>,
{
    match iter.next_if(|value| !value.starts_with('-')) {
        Some(value) => Some(value.clone()),
        None => {
            log_warning_standalone!("Missing value for {}. Usage: {} {}", flag, flag, usage);
            None
        }
    }
}

fn parse_month(value: &str) -> Option<u32> {
    match value.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => Some(month),
        _ => {
            log_warning_standalone!("Invalid month: {} (expected 1-12)", value);
            None
        }
    }
}

fn parse_year(value: &str) -> Option<i32> {
    match value.parse::<i32>() {
        Ok(year) if (1..=9999).contains(&year) => Some(year),
        _ => {
            log_warning_standalone!("Invalid year: {} (expected 1-9999)", value);
            None
        }
    }
}

fn resolve_command(raw: RawArgs) -> CliAction {
    let mut positionals = raw.positionals.into_iter();
    let command = positionals.next().unwrap_or_else(|| "times".to_string());
    let extra: Vec<String> = positionals.collect();

    if command == "help" {
        if extra.len() > 1 {
            log_warning_standalone!("Too many arguments. Usage: noor help [COMMAND]");
            return CliAction::ShowHelpDueToError;
        }
        return CliAction::Help {
            command: extra.into_iter().next(),
        };
    }

    if let Some(unexpected) = extra.first() {
        log_warning_standalone!("Unexpected argument for {}: {}", command, unexpected);
        return CliAction::ShowHelpDueToError;
    }

    let misused = |flag: &str, set: bool, allowed: &[&str]| {
        let rejected = set && !allowed.contains(&command.as_str());
        if rejected {
            log_warning_standalone!("{} cannot be used with '{}'", flag, command);
        }
        rejected
    };
    if misused("--json", raw.json, &["times", "t", "month", "m", "calendar", "c"])
        || misused("--month", raw.month.is_some(), &["calendar", "c"])
        || misused("--year", raw.year.is_some(), &["calendar", "c"])
        || misused("--log", raw.log_file.is_some(), &["run", "r"])
        || misused("--at", raw.options.at.is_some(), &["times", "t", "month", "m", "calendar", "c"])
    {
        return CliAction::ShowHelpDueToError;
    }

    match command.as_str() {
        "times" | "t" => CliAction::Times {
            options: raw.options,
            json: raw.json,
        },
        "month" | "m" => CliAction::Month {
            options: raw.options,
            json: raw.json,
        },
        "calendar" | "c" => CliAction::Calendar {
            options: raw.options,
            month: raw.month,
            year: raw.year,
            json: raw.json,
        },
        "run" | "r" => CliAction::Run {
            options: raw.options,
            log_file: raw.log_file,
        },
        unknown => {
            log_warning_standalone!("Unknown command: {}", unknown);
            CliAction::ShowHelpDueToError
        }
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("noor [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("    --at <datetime>    One-shot commands: use \"YYYY-MM-DD HH:MM:SS\" as now");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("times, t [--json]      Today's prayer times and the next prayer (default)");
    log_indented!("month, m [--json]      Hijri date and target-month countdown");
    log_indented!("calendar, c [--json]   Hijri month grid (--month <1-12> --year <AH>)");
    log_indented!("run, r [--log <file>]  Keep running and refresh on schedule");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> GlobalOptions {
        GlobalOptions::default()
    }

    #[test]
    fn test_parse_no_args_defaults_to_times() {
        let parsed = ParsedArgs::parse(vec!["noor"]);
        assert_eq!(
            parsed.action,
            CliAction::Times {
                options: options(),
                json: false
            }
        );
    }

    #[test]
    fn test_parse_debug_flag() {
        let parsed = ParsedArgs::parse(vec!["noor", "--debug"]);
        assert_eq!(
            parsed.action,
            CliAction::Times {
                options: GlobalOptions {
                    debug_enabled: true,
                    ..options()
                },
                json: false
            }
        );
    }

    #[test]
    fn test_parse_help_and_version_flags() {
        assert_eq!(ParsedArgs::parse(vec!["noor", "-h"]).action, CliAction::ShowHelp);
        assert_eq!(
            ParsedArgs::parse(vec!["noor", "--help"]).action,
            CliAction::ShowHelp
        );
        for flag in ["--version", "-V", "-v"] {
            assert_eq!(
                ParsedArgs::parse(vec!["noor", flag]).action,
                CliAction::ShowVersion
            );
        }
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["noor", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_help_takes_precedence_over_errors() {
        let parsed = ParsedArgs::parse(vec!["noor", "--bogus", "--help"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["noor", "--unknown"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["noor", "sunset"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_times_json_with_flags_after_command() {
        let parsed = ParsedArgs::parse(vec!["noor", "times", "--json", "-c", "/tmp/noor", "-d"]);
        assert_eq!(
            parsed.action,
            CliAction::Times {
                options: GlobalOptions {
                    debug_enabled: true,
                    config_dir: Some("/tmp/noor".to_string()),
                    at: None,
                },
                json: true
            }
        );
    }

    #[test]
    fn test_at_flag_before_command() {
        let parsed = ParsedArgs::parse(vec!["noor", "--at", "2026-02-18 21:05:00", "month"]);
        assert_eq!(
            parsed.action,
            CliAction::Month {
                options: GlobalOptions {
                    at: Some("2026-02-18 21:05:00".to_string()),
                    ..options()
                },
                json: false
            }
        );
    }

    #[test]
    fn test_missing_flag_values() {
        for args in [
            vec!["noor", "--config"],
            vec!["noor", "--at"],
            vec!["noor", "--config", "--debug"],
            vec!["noor", "run", "--log"],
        ] {
            assert_eq!(
                ParsedArgs::parse(args).action,
                CliAction::ShowHelpDueToError
            );
        }
    }

    #[test]
    fn test_calendar_month_and_year() {
        let parsed = ParsedArgs::parse(vec!["noor", "c", "--month", "9", "--year", "1447"]);
        assert_eq!(
            parsed.action,
            CliAction::Calendar {
                options: options(),
                month: Some(9),
                year: Some(1447),
                json: false
            }
        );
    }

    #[test]
    fn test_calendar_rejects_bad_month_and_year() {
        for args in [
            vec!["noor", "calendar", "--month", "13"],
            vec!["noor", "calendar", "--month", "0"],
            vec!["noor", "calendar", "--month", "Ramadan"],
            vec!["noor", "calendar", "--year", "0"],
        ] {
            assert_eq!(
                ParsedArgs::parse(args).action,
                CliAction::ShowHelpDueToError
            );
        }
    }

    #[test]
    fn test_command_specific_flags_are_rejected_elsewhere() {
        for args in [
            vec!["noor", "times", "--month", "9"],
            vec!["noor", "run", "--json"],
            vec!["noor", "times", "--log", "/tmp/noor.log"],
            vec!["noor", "--at", "2026-02-18 21:05:00", "run"],
        ] {
            assert_eq!(
                ParsedArgs::parse(args).action,
                CliAction::ShowHelpDueToError
            );
        }
    }

    #[test]
    fn test_run_with_log_file() {
        let parsed = ParsedArgs::parse(vec!["noor", "run", "--log", "/tmp/noor.log"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                options: options(),
                log_file: Some("/tmp/noor.log".to_string())
            }
        );
    }

    #[test]
    fn test_help_command() {
        assert_eq!(
            ParsedArgs::parse(vec!["noor", "help"]).action,
            CliAction::Help { command: None }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["noor", "help", "calendar"]).action,
            CliAction::Help {
                command: Some("calendar".to_string())
            }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["noor", "help", "times", "month"]).action,
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        let parsed = ParsedArgs::parse(vec!["noor", "times", "tomorrow"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
