//! Error types for the client runtime.

use std::io;

use thiserror::Error;

use dygrep_config::TelemetryError;
use dygrep_protocol::EncodeError;

/// Failures that end the client before or outside the event loop.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to switch the terminal to raw mode: {0}")]
    RawMode(io::Error),
    #[error("failed to install signal handlers: {0}")]
    Signals(io::Error),
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Failures on the connection to the server.
///
/// None of these end the client directly; the lifecycle turns them into a
/// reconnect.
#[derive(Debug, Error)]
pub(crate) enum ClientError {
    #[error("failed to resolve server address {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to server at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to send command: {0}")]
    Send(#[from] EncodeError),
}
