//! Interactive client for the `dygrep` filter server.
//!
//! The client puts the terminal into raw mode, edits one command line at a
//! time with tab completion and history, and sends recognised commands to the
//! server over a persistent TCP connection. Server replies are printed as
//! they arrive. A lost connection is retried once after a fixed delay; if the
//! retry does not connect within the watchdog window the client exits with
//! status 1.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use dygrep_config::{ClientArgs, telemetry};

mod command;
mod editor;
mod errors;
mod lifecycle;
mod runtime;
mod screen;
mod transport;

use errors::AppError;
use lifecycle::ExitStatus;

/// Parses `args` and runs the client until it exits.
///
/// Help and version requests exit successfully; usage errors and setup
/// failures are reported on `stderr` and exit with status 1.
pub fn run<I, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
{
    match try_run(args) {
        Ok(status) => status.into(),
        Err(AppError::CliUsage(usage)) => {
            let _ = usage.print();
            if usage.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(failure) => {
            error!(error = %failure, "client stopped with an error");
            let _ = writeln!(stderr, "dygrep: {failure}");
            ExitCode::FAILURE
        }
    }
}

fn try_run<I>(args: I) -> Result<ExitStatus, AppError>
where
    I: IntoIterator<Item = OsString>,
{
    let args = ClientArgs::try_parse_from(args).map_err(AppError::CliUsage)?;
    telemetry::initialise(&args.log_filter(), args.logging.log_format)?;
    runtime::run_client(&args)
}

#[cfg(test)]
mod tests;
