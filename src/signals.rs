//! POSIX signal handling for run mode.
//!
//! A dedicated thread turns signals into [`SignalMessage`] values on a channel
//! that the run loop drains. The config watcher feeds the same channel.
//!
//! | Signal                    | Message    |
//! |---------------------------|------------|
//! | `SIGUSR1`                 | `Refresh`  |
//! | `SIGUSR2`                 | `Reload`   |
//! | `SIGINT` `SIGTERM` `SIGHUP` | `Shutdown` |

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Re-render everything now (SIGUSR1)
    Refresh,
    /// Reload configuration, then refresh (SIGUSR2 or a config file change)
    Reload,
    /// Release all consumer groups and exit (SIGINT, SIGTERM, SIGHUP)
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown signal arrives
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Extra producers (the config watcher) clone this sender
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Map a raw signal number to the message it requests.
pub fn message_for_signal(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGUSR1 => Some(SignalMessage::Refresh),
        SIGUSR2 => Some(SignalMessage::Reload),
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

fn shutdown_description(signal: i32) -> &'static str {
    match signal {
        SIGINT => "Received interrupt signal, shutting down...",
        SIGTERM => "Received termination request, shutting down...",
        SIGHUP => "Received hangup signal, shutting down...",
        _ => "Received shutdown signal, shutting down...",
    }
}

pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    let sender = signal_sender.clone();

    thread::Builder::new()
        .name("noor-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let Some(message) = message_for_signal(sig) else {
                    continue;
                };

                match message {
                    SignalMessage::Refresh => log_debug!("Received SIGUSR1, refreshing"),
                    SignalMessage::Reload => log_debug!("Received SIGUSR2, reloading configuration"),
                    SignalMessage::Shutdown => {
                        log_pipe!();
                        log_info!("{}", shutdown_description(sig));
                        running_clone.store(false, Ordering::SeqCst);
                    }
                }

                if sender.send(message).is_err() {
                    // Receiver dropped: the run loop has exited.
                    break;
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}
