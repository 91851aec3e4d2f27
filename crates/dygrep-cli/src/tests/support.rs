//! Shared helpers for runtime tests.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use dygrep_protocol::{
    Command, CommandPolicy, CommandRequest, MessageDecoder, Response, write_message,
};

const WAIT_LIMIT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Screen output that stays readable after the runtime moves to its thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub(crate) fn text(&self) -> String {
        let bytes = self.0.lock().expect("output lock").clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Polls until `needle` has been written.
    pub(crate) fn wait_for(&self, needle: &str) {
        let deadline = Instant::now() + WAIT_LIMIT;
        while Instant::now() < deadline {
            if self.text().contains(needle) {
                return;
            }
            thread::sleep(POLL_INTERVAL);
        }
        panic!("{needle:?} never appeared in {:?}", self.text());
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("output lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Minimal server side of one client connection.
pub(crate) struct FakeServer {
    stream: TcpStream,
    decoder: MessageDecoder<CommandRequest>,
}

impl FakeServer {
    pub(crate) fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().expect("accept client");
        stream
            .set_read_timeout(Some(WAIT_LIMIT))
            .expect("read timeout");
        Self {
            stream,
            decoder: MessageDecoder::new(),
        }
    }

    pub(crate) fn next_command(&mut self) -> Command {
        let mut chunk = [0_u8; 1024];
        loop {
            let read = self.stream.read(&mut chunk).expect("read request");
            assert!(read > 0, "client closed before sending a command");
            if let Some(outcome) = self.decoder.feed(&chunk[..read]).into_iter().next() {
                let request = outcome.expect("well-formed request");
                return request
                    .into_command(CommandPolicy::Legacy)
                    .expect("single command");
            }
        }
    }

    pub(crate) fn reply(&mut self, response: &Response) {
        write_message(&mut self.stream, response).expect("write reply");
    }
}

/// Returns a local port with nothing listening on it.
pub(crate) fn vacant_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind spare port");
    listener.local_addr().expect("spare port address").port()
}
