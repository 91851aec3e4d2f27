//! Line ingestion from the tailed source and local display.

use std::io::{self, BufRead, IsTerminal, Write};
use std::thread;

use crossterm::style::Stylize;
use tracing::{debug, warn};

use crate::filter::IngestedLine;
use crate::queue::QueueHandle;

const INGEST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ingest");

/// Destination for lines that survive the display mode.
pub trait LineSink: Send + 'static {
    /// Shows a single line.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the line cannot be written.
    fn display(&mut self, line: &IngestedLine) -> io::Result<()>;
}

/// Writes lines to a terminal or plain stream.
///
/// Filtered lines are highlighted when colour is enabled.
#[derive(Debug)]
pub struct TerminalSink<W> {
    writer: W,
    colour: bool,
}

impl TerminalSink<io::Stdout> {
    /// Sink on standard output, coloured only on an interactive terminal.
    #[must_use]
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let colour = stdout.is_terminal();
        Self::new(stdout, colour)
    }
}

impl<W: Write> TerminalSink<W> {
    /// Wraps `writer`.
    pub const fn new(writer: W, colour: bool) -> Self {
        Self { writer, colour }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> LineSink for TerminalSink<W> {
    fn display(&mut self, line: &IngestedLine) -> io::Result<()> {
        if line.filtered && self.colour {
            writeln!(self.writer, "{}", line.text.as_str().black().on_yellow())?;
        } else if line.filtered {
            writeln!(self.writer, "> {}", line.text)?;
        } else {
            writeln!(self.writer, "{}", line.text)?;
        }
        self.writer.flush()
    }
}

/// Reads `source` line by line on a background thread and queues each line.
///
/// Invalid UTF-8 is replaced rather than rejected. The thread ends at end of
/// input, on a read error, or when the queue closes.
///
/// # Errors
///
/// Returns the spawn error when the thread cannot be created.
pub fn spawn_ingest<R>(source: R, queue: QueueHandle) -> io::Result<thread::JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name(String::from("dygrepd-ingest"))
        .spawn(move || pump_lines(source, &queue))
}

fn pump_lines<R: BufRead>(mut source: R, queue: &QueueHandle) {
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match source.read_until(b'\n', &mut raw) {
            Ok(0) => {
                debug!(target: INGEST_TARGET, "ingest source reached end of input");
                return;
            }
            Ok(_) => {
                let line = decode_line(&raw);
                if queue.ingest(line).is_err() {
                    debug!(target: INGEST_TARGET, "queue closed; ingest stopping");
                    return;
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => {
                warn!(target: INGEST_TARGET, %error, "failed to read ingest source");
                return;
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let trimmed = raw.strip_suffix(b"\n").unwrap_or(raw);
    let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);
    String::from_utf8_lossy(trimmed).into_owned()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn line(text: &str, filtered: bool) -> IngestedLine {
        IngestedLine {
            text: String::from(text),
            filtered,
        }
    }

    #[rstest]
    #[case(b"plain\n".as_slice(), "plain")]
    #[case(b"crlf\r\n".as_slice(), "crlf")]
    #[case(b"no newline".as_slice(), "no newline")]
    #[case(b"bad \xff byte\n".as_slice(), "bad \u{fffd} byte")]
    fn lines_are_decoded_leniently(#[case] raw: &[u8], #[case] expected: &str) {
        assert_eq!(decode_line(raw), expected);
    }

    #[test]
    fn plain_sink_marks_filtered_lines() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.display(&line("quiet", false)).expect("display");
        sink.display(&line("loud", true)).expect("display");
        let output = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(output, "quiet\n> loud\n");
    }

    #[test]
    fn coloured_sink_styles_filtered_lines() {
        let mut sink = TerminalSink::new(Vec::new(), true);
        sink.display(&line("loud", true)).expect("display");
        let output = String::from_utf8(sink.into_inner()).expect("utf8");
        assert!(output.contains("loud"));
        assert!(!output.starts_with("> "), "colour replaces the plain marker");
    }
}
