//! Line-tailing server with remotely managed regex filters.
//!
//! `dygrepd` reads lines from standard input, keeps a bounded history, and
//! highlights lines that match any of the live filters. Clients connect over
//! TCP and manage the filter set or search the history through a stream of
//! JSON messages.
//!
//! All filter state lives on one queue worker thread. Client commands and
//! ingested lines are events on the same FIFO channel, so commands execute
//! one at a time in arrival order and every line sees a consistent filter
//! set.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use dygrep_config::ServerArgs;

pub mod filter;
pub mod ingest;
mod process;
pub mod queue;
pub mod transport;

pub use filter::{CommandError, DisplayMode, FilterState, IngestedLine, LineBuffer, RegexStore};
pub use ingest::{LineSink, TerminalSink, spawn_ingest};
pub use process::{
    LaunchError, RunningServer, ServerSettings, ShutdownError, ShutdownSignal,
    SystemShutdownSignal, run_server, start_server,
};
pub use queue::{CommandQueue, QueueError, QueueHandle, Responder};
pub use transport::{ConnectionId, ConnectionRegistry};

/// Parses `args` and runs the server until it is told to stop.
///
/// Help and version requests exit successfully; usage errors and runtime
/// failures are reported on `stderr` and exit with status 1.
pub fn run<I, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
{
    let args = match ServerArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(usage) => {
            let _ = usage.print();
            return if usage.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run_server(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(error = %failure, "server stopped with an error");
            let _ = writeln!(stderr, "dygrepd: {failure}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
