//! Shared configuration for the `dygrep` server and client.
//!
//! Both binaries take their settings from the command line with environment
//! fallbacks. This crate owns the argument models, the defaults they fall back
//! to, and the logging setup so the two ends agree on ports, timings and log
//! output.

mod args;
mod defaults;
mod endpoint;
mod logging;
pub mod telemetry;

pub use args::{ClientArgs, ConnectionArgs, LoggingArgs, ServerArgs};
pub use defaults::{
    CLIENT_LOG_FILTER, DEFAULT_HOST, DEFAULT_PORT, HISTORY_CAPACITY, INGEST_BACKLOG,
    RECONNECT_DELAY, RESULT_PAGE_LINES, SERVER_LOG_FILTER, SHUTDOWN_GRACE, WATCHDOG_TIMEOUT,
};
pub use endpoint::Endpoint;
pub use logging::{
    DEBUG_ENV_VAR, LEGACY_DEBUG_ENV_VAR, LogFormat, LogFormatParseError, debug_flag,
    debug_requested, resolve_log_filter,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
