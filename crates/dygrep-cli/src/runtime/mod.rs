//! Event loop wiring the connection lifecycle, the editor and the terminal.
//!
//! Every source of input runs on its own thread and reports through one
//! [`ClientEvent`] channel: the keyboard reader, the signal listener, one
//! connect worker per attempt and one socket reader per connection
//! generation. The [`ClientRuntime`] owns all mutable state and is the only
//! consumer of that channel.

mod input;
mod session;

use std::net::TcpStream;
use std::sync::mpsc;

use dygrep_config::ClientArgs;
use dygrep_protocol::Response;

use crate::errors::{AppError, ClientError};
use crate::lifecycle::{ConnectionLifecycle, ExitStatus, Generation};
use crate::screen::Screen;

pub(crate) use session::ClientRuntime;

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Input delivered to the runtime loop.
#[derive(Debug)]
pub(crate) enum ClientEvent {
    /// Raw bytes read from the keyboard.
    Keys(Vec<u8>),
    /// Standard input reached end of stream.
    KeyboardClosed,
    /// Something happened on the socket of `generation`.
    Socket {
        generation: Generation,
        event: SocketEvent,
    },
    /// A connect worker finished.
    ConnectResult {
        generation: Generation,
        result: Result<TcpStream, ClientError>,
    },
    /// A termination signal arrived.
    Signal(i32),
}

/// Socket reader output for one connection generation.
#[derive(Debug)]
pub(crate) enum SocketEvent {
    Message(Response),
    Garbled(String),
    Closed,
    Failed(String),
}

/// Runs the interactive client until it exits.
pub(crate) fn run_client(args: &ClientArgs) -> Result<ExitStatus, AppError> {
    let endpoint = args.connection.endpoint();
    let (events_tx, events) = mpsc::channel();
    input::spawn_signal_listener(events_tx.clone())?;
    let _raw_mode = input::RawModeGuard::enable()?;
    input::spawn_keyboard_reader(events_tx.clone())?;
    let runtime = ClientRuntime::new(
        endpoint.clone(),
        ConnectionLifecycle::default(),
        Screen::stdout(&endpoint),
        (events_tx, events),
    );
    Ok(runtime.run())
}
