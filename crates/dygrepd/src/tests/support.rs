//! Shared fixtures for server behaviour tests.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use dygrep_protocol::{Command, CommandRequest, MessageDecoder, Response, write_message};

use crate::filter::IngestedLine;
use crate::ingest::LineSink;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Readable source fed from the test thread.
///
/// Reads block until a chunk arrives and report end of input once every
/// sender is dropped.
pub(crate) struct LineFeed {
    chunks: Receiver<Vec<u8>>,
    current: VecDeque<u8>,
}

impl LineFeed {
    pub(crate) const fn new(chunks: Receiver<Vec<u8>>) -> Self {
        Self {
            chunks,
            current: VecDeque::new(),
        }
    }
}

impl Read for LineFeed {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.current.is_empty() {
            match self.chunks.recv() {
                Ok(chunk) => self.current.extend(chunk),
                Err(_) => return Ok(0),
            }
        }
        let count = buf.len().min(self.current.len());
        for (slot, byte) in buf.iter_mut().zip(self.current.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

pub(crate) fn feed_line(feed: &Sender<Vec<u8>>, line: &str) {
    feed.send(format!("{line}\n").into_bytes())
        .expect("ingest feed open");
}

/// Sink that records every displayed line.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    lines: Arc<Mutex<Vec<IngestedLine>>>,
}

impl RecordingSink {
    /// Waits until `text` has been displayed and returns its record.
    pub(crate) fn wait_for(&self, text: &str) -> Option<IngestedLine> {
        let deadline = Instant::now() + READ_TIMEOUT;
        loop {
            let found = self
                .lines
                .lock()
                .expect("sink lock")
                .iter()
                .find(|line| line.text == text)
                .cloned();
            if found.is_some() || Instant::now() >= deadline {
                return found;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl LineSink for RecordingSink {
    fn display(&mut self, line: &IngestedLine) -> io::Result<()> {
        self.lines.lock().expect("sink lock").push(line.clone());
        Ok(())
    }
}

/// Minimal protocol client used to drive the server over TCP.
pub(crate) struct TestClient {
    stream: TcpStream,
    decoder: MessageDecoder<Response>,
    pending: VecDeque<Response>,
}

impl TestClient {
    pub(crate) fn connect(address: SocketAddr) -> Self {
        let stream = TcpStream::connect(address).expect("connect to server");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        Self {
            stream,
            decoder: MessageDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn send(&mut self, command: &Command) {
        write_message(&mut self.stream, &CommandRequest::from(command)).expect("send request");
    }

    pub(crate) fn next(&mut self) -> Response {
        let mut chunk = [0_u8; 4096];
        while self.pending.is_empty() {
            let read = self.stream.read(&mut chunk).expect("read response");
            assert!(read > 0, "server closed the connection");
            for outcome in self.decoder.feed(&chunk[..read]) {
                self.pending.push_back(outcome.expect("decode response"));
            }
        }
        self.pending.pop_front().expect("pending response")
    }

    /// Reads messages up to and including the next final one.
    pub(crate) fn reply(&mut self) -> Vec<Response> {
        let mut reply = Vec::new();
        loop {
            let response = self.next();
            let last = response.is_final();
            reply.push(response);
            if last {
                return reply;
            }
        }
    }

    /// True once the server has closed this connection.
    pub(crate) fn is_closed(&mut self) -> bool {
        let mut chunk = [0_u8; 64];
        matches!(self.stream.read(&mut chunk), Ok(0) | Err(_))
    }
}
