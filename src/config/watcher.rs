//! Config file watching for hot reload in run mode.
//!
//! The parent directory is watched rather than the file itself, since most
//! editors save by writing a temporary file and renaming it over the original.

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::common::constants::CONFIG_WATCH_DEBOUNCE_MS;
use crate::signals::SignalMessage;

pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, config_path: PathBuf) -> Self {
        Self {
            signal_sender,
            config_path,
        }
    }

    /// Spawn the watcher thread. Sends [`SignalMessage::Reload`] for changes
    /// to the config file, at most once per debounce window.
    pub fn start(self) -> Result<()> {
        let Some(dir) = self.config_path.parent().map(Path::to_path_buf) else {
            log_debug!("Config path has no parent directory, not watching");
            return Ok(());
        };
        if !dir.is_dir() {
            log_debug!("Config directory {} does not exist, not watching", dir.display());
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        log_debug!("Watching {} for changes", self.config_path.display());

        let signal_sender = self.signal_sender;
        let config_path = self.config_path;

        thread::Builder::new()
            .name("noor-config-watcher".to_string())
            .spawn(move || {
                // The watcher stops when dropped, so the thread owns it.
                let _watcher = watcher;
                let debounce = Duration::from_millis(CONFIG_WATCH_DEBOUNCE_MS);
                let mut last_reload: Option<Instant> = None;

                for event in rx {
                    if !affects_config(&event, &config_path) {
                        continue;
                    }
                    if last_reload.is_some_and(|at| at.elapsed() < debounce) {
                        continue;
                    }

                    log_debug!("Configuration file change detected");
                    if signal_sender.send(SignalMessage::Reload).is_err() {
                        break;
                    }
                    last_reload = Some(Instant::now());
                }
            })
            .context("Failed to spawn config watcher thread")?;

        Ok(())
    }
}

/// Whether `event` touches the config file, including editor temp files that
/// share its name as a prefix.
fn affects_config(event: &Event, config_path: &Path) -> bool {
    let Some(config_name) = config_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    event.paths.iter().any(|path| {
        path == config_path
            || (path.parent() == config_path.parent()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with(config_name)))
    })
}

/// Start watching the config file, sending reload requests to `signal_sender`.
pub fn start_config_watcher(signal_sender: Sender<SignalMessage>, config_path: PathBuf) -> Result<()> {
    ConfigWatcher::new(signal_sender, config_path).start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn matches_config_and_editor_temp_files() {
        let config = Path::new("/home/u/.config/noor/noor.toml");
        assert!(affects_config(
            &event(EventKind::Modify(ModifyKind::Any), "/home/u/.config/noor/noor.toml"),
            config
        ));
        assert!(affects_config(
            &event(EventKind::Create(CreateKind::File), "/home/u/.config/noor/noor.toml.swp"),
            config
        ));
        assert!(!affects_config(
            &event(EventKind::Modify(ModifyKind::Any), "/home/u/.config/noor/other.toml"),
            config
        ));
        assert!(!affects_config(
            &event(EventKind::Modify(ModifyKind::Any), "/tmp/noor.toml"),
            config
        ));
    }

    #[test]
    fn sends_reload_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noor.toml");
        std::fs::write(&path, "").unwrap();

        let (tx, rx) = mpsc::channel();
        start_config_watcher(tx, path.clone()).unwrap();
        thread::sleep(Duration::from_millis(100));
        std::fs::write(&path, "time_format = \"24h\"\n").unwrap();

        let message = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(message, SignalMessage::Reload);
    }
}
