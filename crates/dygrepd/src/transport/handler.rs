//! Per-connection request handling.

use std::io::{self, Read};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::{debug, warn};

use dygrep_protocol::{
    CommandPolicy, CommandRequest, DecodeError, MessageDecoder, Response, write_message,
};

use super::{ConnectionRegistry, LISTENER_TARGET};
use crate::queue::{QueueHandle, Responder};

const READ_CHUNK_BYTES: usize = 4096;

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream);
}

/// Decodes client requests and feeds them to the command queue.
///
/// Each connection gets a writer thread draining its outbound channel, so
/// replies from the queue and broadcasts from the registry never block the
/// worker on a slow client.
#[derive(Debug, Clone)]
pub(crate) struct CommandConnectionHandler {
    queue: QueueHandle,
    registry: ConnectionRegistry,
    policy: CommandPolicy,
}

impl CommandConnectionHandler {
    pub(crate) const fn new(
        queue: QueueHandle,
        registry: ConnectionRegistry,
        policy: CommandPolicy,
    ) -> Self {
        Self {
            queue,
            registry,
            policy,
        }
    }

    fn serve(&self, mut stream: TcpStream, responder: &Responder) {
        let mut decoder = MessageDecoder::<CommandRequest>::new();
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => {
                    for outcome in decoder.feed(&chunk[..read]) {
                        self.dispatch(outcome, responder);
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    debug!(
                        target: LISTENER_TARGET,
                        connection = %responder.connection(),
                        %error,
                        "connection read failed"
                    );
                    break;
                }
            }
        }
        if let Some(error) = decoder.finish() {
            warn!(
                target: LISTENER_TARGET,
                connection = %responder.connection(),
                %error,
                "connection closed mid-message"
            );
        }
    }

    fn dispatch(&self, outcome: Result<CommandRequest, DecodeError>, responder: &Responder) {
        let request = match outcome {
            Ok(request) => request,
            Err(error) => {
                reject(responder, &error);
                return;
            }
        };
        let command = match request.into_command(self.policy) {
            Ok(command) => command,
            Err(rejection) => {
                reject(responder, &rejection);
                return;
            }
        };
        if let Err(error) = self.queue.submit(command, responder.clone()) {
            reject(responder, &error);
        }
    }
}

impl ConnectionHandler for CommandConnectionHandler {
    fn handle(&self, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map_or_else(|_| String::from("unknown"), |address| address.to_string());
        let clones = stream.try_clone().and_then(|writer| Ok((writer, stream.try_clone()?)));
        let (writer_stream, close_handle) = match clones {
            Ok(clones) => clones,
            Err(error) => {
                warn!(target: LISTENER_TARGET, %peer, %error, "failed to clone connection");
                return;
            }
        };

        let (outbound, inbox) = mpsc::channel();
        let connection = match self
            .registry
            .register(peer.clone(), outbound.clone(), Some(close_handle))
        {
            Ok(connection) => connection,
            Err(error) => {
                warn!(target: LISTENER_TARGET, %peer, %error, "failed to register connection");
                return;
            }
        };

        let spawned = thread::Builder::new()
            .name(String::from("dygrepd-writer"))
            .spawn(move || drain_responses(writer_stream, &inbox));
        if let Err(error) = spawned {
            warn!(target: LISTENER_TARGET, %connection, %error, "failed to spawn writer");
        } else {
            let responder = Responder::new(connection, outbound);
            self.serve(stream, &responder);
        }

        if let Err(error) = self.registry.unregister(connection) {
            warn!(target: LISTENER_TARGET, %connection, %error, "failed to unregister connection");
        }
    }
}

/// Writes queued responses until every sender is gone or the peer goes away.
fn drain_responses(mut stream: TcpStream, inbox: &Receiver<Response>) {
    while let Ok(response) = inbox.recv() {
        if let Err(error) = write_message(&mut stream, &response) {
            debug!(target: LISTENER_TARGET, %error, "connection writer stopped");
            return;
        }
    }
}

fn reject(responder: &Responder, reason: &dyn std::error::Error) {
    warn!(
        target: LISTENER_TARGET,
        connection = %responder.connection(),
        error = %reason,
        "request rejected"
    );
    responder.respond(Response::text(format!("error: {reason}")));
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::time::Duration;

    use dygrep_protocol::{Command, ResponseMessage, encode};
    use rstest::rstest;

    use super::*;
    use crate::filter::FilterState;
    use crate::ingest::TerminalSink;
    use crate::queue::CommandQueue;

    struct Harness {
        _queue: CommandQueue,
        client: TcpStream,
        decoder: MessageDecoder<Response>,
        pending: Vec<Response>,
    }

    impl Harness {
        fn start(policy: CommandPolicy) -> Self {
            let registry = ConnectionRegistry::new();
            let queue = CommandQueue::start(
                FilterState::default(),
                registry.clone(),
                TerminalSink::new(io::sink(), false),
            )
            .expect("start queue");
            let handler = Arc::new(CommandConnectionHandler::new(queue.handle(), registry, policy));
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
            let address = listener.local_addr().expect("address");
            thread::spawn(move || {
                if let Ok((stream, _)) = listener.accept() {
                    handler.handle(stream);
                }
            });
            let client = TcpStream::connect(address).expect("connect");
            client
                .set_read_timeout(Some(Duration::from_secs(5)))
                .expect("timeout");
            Self {
                _queue: queue,
                client,
                decoder: MessageDecoder::new(),
                pending: Vec::new(),
            }
        }

        fn send_raw(&mut self, bytes: &[u8]) {
            self.client.write_all(bytes).expect("write");
        }

        fn next_response(&mut self) -> Response {
            let mut chunk = [0_u8; 1024];
            while self.pending.is_empty() {
                let read = self.client.read(&mut chunk).expect("read");
                assert!(read > 0, "server closed the connection");
                for outcome in self.decoder.feed(&chunk[..read]) {
                    self.pending.push(outcome.expect("decode response"));
                }
            }
            self.pending.remove(0)
        }
    }

    fn text_of(response: &Response) -> &str {
        match &response.message {
            ResponseMessage::Text(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn fragmented_request_is_answered() {
        let mut harness = Harness::start(CommandPolicy::Legacy);
        let request = br#"{"command":{"add":"warn"}}"#;
        for byte in request {
            harness.send_raw(std::slice::from_ref(byte));
        }
        let response = harness.next_response();
        assert_eq!(text_of(&response), "Added regex: warn.");
        assert!(response.is_final());
    }

    #[test]
    fn malformed_fragment_does_not_block_following_request() {
        let mut harness = Harness::start(CommandPolicy::Legacy);
        harness.send_raw(b"{oops} ");
        let list = encode(&CommandRequest::from(&Command::List)).expect("encode");
        harness.send_raw(&list);

        let first = harness.next_response();
        assert!(text_of(&first).starts_with("error: malformed message"));
        let second = harness.next_response();
        assert!(matches!(second.message, ResponseMessage::Regexes { .. }));
    }

    #[rstest]
    #[case(CommandPolicy::Legacy, "Removed all regexes.")]
    #[case(CommandPolicy::Strict, "error: ambiguous command: fields removeall, add are all set")]
    fn multi_field_requests_follow_policy(#[case] policy: CommandPolicy, #[case] expected: &str) {
        let mut harness = Harness::start(policy);
        harness.send_raw(br#"{"command":{"add":"x","removeall":true}}"#);
        assert_eq!(text_of(&harness.next_response()), expected);
    }
}
