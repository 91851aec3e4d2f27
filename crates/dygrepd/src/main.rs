//! Entrypoint for the `dygrepd` server.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked: worker threads log to stderr while the server runs.
    let mut stderr = io::stderr();
    dygrepd::run(std::env::args_os(), &mut stderr)
}
