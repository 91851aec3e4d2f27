//! Entrypoint for the interactive `dygrep` client.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr();
    dygrep_cli::run(std::env::args_os(), &mut stderr)
}
