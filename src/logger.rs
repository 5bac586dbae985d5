//! Structured terminal logging with box-drawing output.
//!
//! Every line is routed through [`Log::emit`], which applies the optional
//! timestamp prefix and the line decoration for its [`Line`] kind. Output goes
//! to stdout, or to a background file writer once [`Log::start_file_logging`]
//! has been called.
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (`┃` spacer, then `┣ message`).
//! - `log_decorated!` continues a block (`┣ message`).
//! - `log_indented!` lists details that belong to the previous line (`┃   message`).
//! - `log_pipe!` inserts a bare `┃` before a leveled message that opens a block.
//! - `log_version!` / `log_end!` frame a whole run.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_critical!` carry a colored
//!   `[LEVEL]` tag. `log_debug!` only prints once [`Log::set_debug`] is on.
//!
//! Library code (the scheduler in particular) logs through the same macros, so
//! tests and embedders that want silence call `Log::set_enabled(false)`.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Decoration applied to a single emitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Decorated,
    Indented,
    Pipe,
    BlockStart,
    Version,
    End,
    Info,
    Warning,
    WarningStandalone,
    Error,
    ErrorStandalone,
    Debug,
    Critical,
}

impl Line {
    fn render(self, prefix: &str, message: &str) -> String {
        match self {
            Line::Decorated => format!("{prefix}┣ {message}\n"),
            Line::Indented => format!("{prefix}┃   {message}\n"),
            Line::Pipe => format!("{prefix}┃\n"),
            Line::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
            Line::Version => format!("{prefix}┏ {message} ━━╸\n"),
            Line::End => format!("{prefix}╹\n"),
            Line::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
            Line::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
            Line::WarningStandalone => format!("{prefix}[\x1b[33mWARNING\x1b[0m] {message}\n"),
            Line::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
            Line::ErrorStandalone => format!("{prefix}[\x1b[31mERROR\x1b[0m] {message}\n"),
            Line::Debug => format!("{prefix}┣[\x1b[36mDEBUG\x1b[0m] {message}\n"),
            Line::Critical => format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
        }
    }
}

/// Global logging switches and the emit entry point used by the macros.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with `[HH:MM:SS]` taken from the time source.
    ///
    /// Used by the long-running mode where refreshes arrive asynchronously and
    /// the reader needs to see when each one happened.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Mirror all output into `file_path` via a writer thread.
    ///
    /// Can be installed once per process; the returned guard flushes and joins
    /// the writer when dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Render and write one line. Called by the exported macros.
    pub fn emit(line: Line, message: &str) {
        if !Self::is_enabled() || (line == Line::Debug && !Self::is_debug()) {
            return;
        }
        let prefix = Self::timestamp_prefix();
        write_output(&line.render(&prefix, message));
    }

    fn timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", crate::time_source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that flushes the writer on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Turn macro arguments into the message string: a format literal with
/// arguments, or any `Display` expression.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_message {
    ($fmt:literal $($arg:tt)*) => {
        format!($fmt $($arg)*)
    };
    ($expr:expr) => {
        ($expr).to_string()
    };
}

#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Decorated, &$crate::__log_message!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Indented, &$crate::__log_message!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::Log::emit($crate::logger::Line::Pipe, "")
    };
}

#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::BlockStart, &$crate::__log_message!($($arg)+))
    };
}

/// Print the `┏ noor vX.Y.Z ━━╸` header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::Log::emit(
            $crate::logger::Line::Version,
            &format!("noor v{}", env!("CARGO_PKG_VERSION")),
        )
    };
}

#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::Log::emit($crate::logger::Line::End, "")
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Info, &$crate::__log_message!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Warning, &$crate::__log_message!($($arg)+))
    };
}

/// Warning without the pipe decoration, for output outside a block.
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit(
            $crate::logger::Line::WarningStandalone,
            &$crate::__log_message!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Error, &$crate::__log_message!($($arg)+))
    };
}

/// Error without the pipe decoration, for output outside a block.
#[macro_export]
macro_rules! log_error_standalone {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit(
            $crate::logger::Line::ErrorStandalone,
            &$crate::__log_message!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Debug, &$crate::__log_message!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::logger::Log::emit($crate::logger::Line::Critical, &$crate::__log_message!($($arg)+))
    };
}
