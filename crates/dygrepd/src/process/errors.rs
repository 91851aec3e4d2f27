//! Defines the error surface for server launch and shutdown.

use std::io;
use std::time::Duration;

use thiserror::Error;

use dygrep_config::TelemetryError;

use crate::queue::QueueError;
use crate::transport::{ListenerError, RegistryError};

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or stopping the server.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The listener failed to bind, start, or stop.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The command queue failed to start or stop.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// The connection registry was unusable during shutdown.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Shutdown signal handling failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    /// A background thread could not be spawned.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        /// What the thread was for.
        role: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The graceful close did not finish within its budget.
    #[error("graceful shutdown did not finish within {} ms", .grace.as_millis())]
    ShutdownTimeout {
        /// The budget that elapsed.
        grace: Duration,
    },
}
