//! Events, actions and states exchanged with the lifecycle machine.

use std::fmt;
use std::process::ExitCode;

/// Identifies one connection attempt and the socket it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Generation(u64);

impl Generation {
    pub(crate) const fn first() -> Self {
        Self(1)
    }

    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Where the client stands with respect to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Terminated,
}

/// Inputs to the lifecycle machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LifecycleEvent {
    /// Begin the first connection attempt.
    Start,
    /// The attempt for `generation` produced a socket.
    Connected { generation: Generation },
    /// The attempt for `generation` failed.
    ConnectFailed {
        generation: Generation,
        reason: String,
    },
    /// The server ended the stream of `generation`.
    SocketClosed { generation: Generation },
    /// Reading from the socket of `generation` failed.
    SocketFailed {
        generation: Generation,
        reason: String,
    },
    /// Time has passed; due deadlines fire.
    Tick,
    /// A signal or the end-of-input key asked the client to stop.
    Shutdown,
}

/// How the process should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitStatus {
    Success,
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::SUCCESS,
            ExitStatus::Failure => Self::FAILURE,
        }
    }
}

/// User-facing lifecycle messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    /// The first connection succeeded.
    Connected,
    /// A later connection succeeded.
    Reconnected,
    /// The socket was lost; a reconnect follows after the delay.
    Disconnected { reason: Option<String> },
    /// The watchdog expired before a reconnect succeeded.
    GaveUp,
}

impl fmt::Display for Notice {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => formatter.write_str("dygrep client is connected to the server"),
            Self::Reconnected => formatter.write_str("socket reconnected."),
            Self::Disconnected { reason: Some(reason) } => write!(
                formatter,
                "socket experienced an error: {reason}; will try to reconnect in 5 seconds..."
            ),
            Self::Disconnected { reason: None } => {
                formatter.write_str("socket disconnected, will try to reconnect in 5 seconds...")
            }
            Self::GaveUp => {
                formatter.write_str("dygrep socket could not re-connect, so we will exit.")
            }
        }
    }
}

/// Work the runtime performs on behalf of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LifecycleAction {
    /// Start a connection attempt tagged with `generation`.
    Connect { generation: Generation },
    /// Adopt the socket of `generation` and start reading from it.
    Attach { generation: Generation },
    /// Stop reading from and destroy the socket of `generation`.
    Detach { generation: Generation },
    /// Tell the user something.
    Notify(Notice),
    /// End the process.
    Exit(ExitStatus),
}
