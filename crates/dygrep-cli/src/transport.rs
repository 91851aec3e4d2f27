//! Socket helpers for reaching the server.

use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::debug;

use dygrep_config::Endpoint;
use dygrep_protocol::{MessageDecoder, Response};

use crate::errors::ClientError;
use crate::lifecycle::Generation;
use crate::runtime::{ClientEvent, SocketEvent};

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

pub(crate) fn connect(endpoint: &Endpoint) -> Result<TcpStream, ClientError> {
    let address = resolve_tcp_address(&endpoint.host, endpoint.port).map_err(|source| {
        ClientError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        }
    })?;
    TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT).map_err(|source| {
        ClientError::Connect {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

/// Reads responses for one connection generation until the socket ends.
pub(crate) fn pump_responses(
    mut stream: TcpStream,
    generation: Generation,
    events: &Sender<ClientEvent>,
) {
    let mut decoder = MessageDecoder::<Response>::new();
    let mut chunk = [0_u8; 4096];
    let ending = loop {
        match stream.read(&mut chunk) {
            Ok(0) => break SocketEvent::Closed,
            Ok(read) => {
                for outcome in decoder.feed(&chunk[..read]) {
                    let event = match outcome {
                        Ok(response) => SocketEvent::Message(response),
                        Err(error) => SocketEvent::Garbled(error.to_string()),
                    };
                    if events.send(ClientEvent::Socket { generation, event }).is_err() {
                        return;
                    }
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => break SocketEvent::Failed(error.to_string()),
        }
    };
    debug!(target: TRANSPORT_TARGET, %generation, "socket reader stopped");
    let _ = events.send(ClientEvent::Socket {
        generation,
        event: ending,
    });
}
