//! Threads feeding keyboard bytes and signals into the runtime.

use std::io::{self, IsTerminal, Read};
use std::sync::mpsc::Sender;
use std::thread;

use crossterm::terminal;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{debug, info, warn};

use crate::errors::AppError;

use super::{ClientEvent, RUNTIME_TARGET};

/// Keeps the terminal in raw mode for as long as it lives.
///
/// Nothing changes when standard input is not a terminal.
#[derive(Debug)]
pub(crate) struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    pub(crate) fn enable() -> Result<Self, AppError> {
        if !io::stdin().is_terminal() {
            debug!(target: RUNTIME_TARGET, "standard input is not a terminal; raw mode skipped");
            return Ok(Self { enabled: false });
        }
        terminal::enable_raw_mode().map_err(AppError::RawMode)?;
        Ok(Self { enabled: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        if let Err(error) = terminal::disable_raw_mode() {
            warn!(target: RUNTIME_TARGET, %error, "failed to restore the terminal mode");
        }
    }
}

pub(crate) fn spawn_signal_listener(events: Sender<ClientEvent>) -> Result<(), AppError> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGQUIT, SIGHUP]).map_err(AppError::Signals)?;
    thread::Builder::new()
        .name(String::from("dygrep-signals"))
        .spawn(move || {
            for signal in signals.forever() {
                info!(target: RUNTIME_TARGET, signal, "shutdown signal received");
                if events.send(ClientEvent::Signal(signal)).is_err() {
                    break;
                }
            }
        })
        .map_err(|source| AppError::Spawn {
            role: "signal listener",
            source,
        })?;
    Ok(())
}

pub(crate) fn spawn_keyboard_reader(events: Sender<ClientEvent>) -> Result<(), AppError> {
    thread::Builder::new()
        .name(String::from("dygrep-keyboard"))
        .spawn(move || read_keys(io::stdin().lock(), &events))
        .map_err(|source| AppError::Spawn {
            role: "keyboard reader",
            source,
        })?;
    Ok(())
}

/// Forwards raw chunks until the source ends or the runtime goes away.
fn read_keys<R: Read>(mut source: R, events: &Sender<ClientEvent>) {
    let mut chunk = [0_u8; 1024];
    loop {
        match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                if events.send(ClientEvent::Keys(chunk[..read].to_vec())).is_err() {
                    return;
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => {
                warn!(target: RUNTIME_TARGET, %error, "keyboard read failed");
                break;
            }
        }
    }
    let _ = events.send(ClientEvent::KeyboardClosed);
}
