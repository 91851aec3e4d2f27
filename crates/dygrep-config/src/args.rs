//! Command-line models for both binaries.

use clap::{Args, Parser};

use crate::defaults::{CLIENT_LOG_FILTER, DEFAULT_HOST, DEFAULT_PORT, SERVER_LOG_FILTER};
use crate::endpoint::Endpoint;
use crate::logging::{LogFormat, debug_requested, resolve_log_filter};

/// Socket settings shared by the server and the client.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// TCP port to listen on or connect to.
    #[arg(short = 'p', long, env = "DYGREP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Host to bind or dial.
    #[arg(long, env = "DYGREP_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
}

impl ConnectionArgs {
    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

/// Logging settings shared by the server and the client.
#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Tracing filter expression (for example `info` or `dygrepd=debug`).
    #[arg(long, env = "DYGREP_LOG_FILTER")]
    pub log_filter: Option<String>,
    /// Log output format.
    #[arg(long, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl LoggingArgs {
    fn filter_or(&self, fallback: &str) -> String {
        resolve_log_filter(self.log_filter.as_deref(), debug_requested(), fallback)
    }
}

/// Arguments accepted by the `dygrepd` server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dygrepd",
    version,
    about = "Tails standard input and filters it with regexes managed by remote clients"
)]
pub struct ServerArgs {
    /// Socket settings.
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Logging settings.
    #[command(flatten)]
    pub logging: LoggingArgs,
    /// Reject requests that set more than one command field.
    #[arg(long)]
    pub strict_commands: bool,
    /// Suppress unmatched lines while at least one filter is active.
    #[arg(long)]
    pub only_matching: bool,
}

impl ServerArgs {
    /// Effective log filter for the server.
    #[must_use]
    pub fn log_filter(&self) -> String {
        self.logging.filter_or(SERVER_LOG_FILTER)
    }
}

/// Arguments accepted by the interactive `dygrep` client.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dygrep",
    version,
    about = "Interactive client that manages dygrep server filters"
)]
pub struct ClientArgs {
    /// Socket settings.
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Logging settings.
    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl ClientArgs {
    /// Effective log filter for the client.
    #[must_use]
    pub fn log_filter(&self) -> String {
        self.logging.filter_or(CLIENT_LOG_FILTER)
    }
}
