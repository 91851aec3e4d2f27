//! Streaming decoder for concatenated JSON messages.
//!
//! Bytes arrive in arbitrary chunks. The decoder buffers them and repeatedly
//! parses one complete value from the front of the buffer, emitting it as soon
//! as it is structurally complete and keeping the remainder for the next
//! attempt. A malformed value is reported and discarded up to its own closing
//! brace, so nothing nested inside it is mistaken for a message and a single
//! bad message never blocks the values behind it. Garbage that does not start
//! a value is skipped up to the next `{`.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Upper bound on bytes held while waiting for a value to complete.
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Errors reported by [`MessageDecoder`].
///
/// None of these are fatal: the decoder keeps going with whatever follows.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The front of the buffer is not valid JSON.
    #[error("malformed message ({skipped} bytes skipped): {source}")]
    Malformed {
        /// Bytes discarded while resynchronising in the current chunk.
        skipped: usize,
        /// Parser error describing the fault.
        #[source]
        source: serde_json::Error,
    },
    /// A complete value arrived but does not match the message schema.
    #[error("message does not match the expected schema: {source}")]
    Schema {
        /// Deserialisation error describing the mismatch.
        #[source]
        source: serde_json::Error,
    },
    /// An incomplete value grew past the pending limit and was discarded.
    #[error("pending message exceeds the {limit} byte limit")]
    Oversized {
        /// The configured limit.
        limit: usize,
    },
    /// The stream ended in the middle of a value.
    #[error("stream ended inside a message ({pending} bytes pending)")]
    Truncated {
        /// Bytes left in the buffer.
        pending: usize,
    },
}

/// Incremental decoder turning byte chunks into typed messages.
#[derive(Debug)]
pub struct MessageDecoder<T> {
    buffer: Vec<u8>,
    limit: usize,
    skip: Option<Skip>,
    awaiting_close: bool,
    marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Default for MessageDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

enum Attempt {
    Empty,
    Incomplete,
    Complete { value: Value, consumed: usize },
    Invalid(serde_json::Error),
}

impl<T: DeserializeOwned> MessageDecoder<T> {
    /// Creates a decoder bounded by [`MAX_PENDING_BYTES`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }

    /// Creates a decoder with a custom pending-byte limit.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
            skip: None,
            awaiting_close: false,
            marker: PhantomData,
        }
    }

    /// Number of bytes buffered while waiting for more input.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds a chunk and returns every outcome it completes, in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<T, DecodeError>> {
        self.buffer.extend_from_slice(chunk);
        let mut outcomes = Vec::new();
        // An open object or array cannot complete without a closing bracket.
        if self.awaiting_close && !chunk.iter().any(|byte| matches!(byte, b'}' | b']')) {
            self.enforce_limit(&mut outcomes);
            return outcomes;
        }
        self.awaiting_close = false;
        while self.skip_malformed() {
            match self.next_message() {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
        self.enforce_limit(&mut outcomes);
        outcomes
    }

    /// Signals end of stream.
    ///
    /// Returns [`DecodeError::Truncated`] when non-whitespace bytes remain.
    pub fn finish(&mut self) -> Option<DecodeError> {
        self.skip = None;
        self.awaiting_close = false;
        self.discard_leading_whitespace();
        if self.buffer.is_empty() {
            return None;
        }
        let pending = self.buffer.len();
        self.buffer.clear();
        Some(DecodeError::Truncated { pending })
    }

    fn next_message(&mut self) -> Option<Result<T, DecodeError>> {
        self.discard_leading_whitespace();
        match self.attempt() {
            Attempt::Empty => None,
            Attempt::Incomplete => {
                self.awaiting_close = self.buffer.first().is_some_and(opens_container);
                None
            }
            Attempt::Complete { value, consumed } => {
                self.buffer.drain(..consumed);
                Some(serde_json::from_value(value).map_err(|source| DecodeError::Schema { source }))
            }
            Attempt::Invalid(source) => {
                let skipped = self.resynchronise();
                Some(Err(DecodeError::Malformed { skipped, source }))
            }
        }
    }

    /// Discards an incomplete value that outgrew the limit, and the rest of it
    /// as it arrives.
    fn enforce_limit(&mut self, outcomes: &mut Vec<Result<T, DecodeError>>) {
        if self.buffer.len() <= self.limit {
            return;
        }
        self.skip = Skip::resume(&self.buffer);
        self.buffer.clear();
        self.awaiting_close = false;
        outcomes.push(Err(DecodeError::Oversized { limit: self.limit }));
    }

    /// Continues discarding a malformed value; true once it has closed.
    fn skip_malformed(&mut self) -> bool {
        let Some(skip) = self.skip.as_mut() else {
            return true;
        };
        if let Some(end) = skip.scan(&self.buffer) {
            self.buffer.drain(..end);
            self.skip = None;
            return true;
        }
        skip.discarded += self.buffer.len();
        self.buffer.clear();
        if skip.discarded > self.limit {
            self.skip = None;
        }
        false
    }

    fn attempt(&self) -> Attempt {
        if self.buffer.is_empty() {
            return Attempt::Empty;
        }
        let mut stream = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
        match stream.next() {
            None => Attempt::Empty,
            Some(Ok(value)) => Attempt::Complete {
                value,
                consumed: stream.byte_offset(),
            },
            Some(Err(error)) if error.is_eof() => Attempt::Incomplete,
            Some(Err(error)) => Attempt::Invalid(error),
        }
    }

    /// Drops the malformed value at the front and returns the count.
    ///
    /// A value that opens with a bracket is dropped through its matching
    /// close, possibly across later chunks. Anything else is dropped up to the
    /// next `{`.
    fn resynchronise(&mut self) -> usize {
        if self.buffer.first().is_some_and(opens_container) {
            let mut skip = Skip::default();
            if let Some(end) = skip.scan(&self.buffer) {
                self.buffer.drain(..end);
                return end;
            }
            let skipped = self.buffer.len();
            skip.discarded = skipped;
            self.buffer.clear();
            self.skip = Some(skip);
            return skipped;
        }
        let boundary = self
            .buffer
            .iter()
            .skip(1)
            .position(|byte| *byte == b'{')
            .map_or(self.buffer.len(), |offset| offset + 1);
        self.buffer.drain(..boundary);
        boundary
    }

    fn discard_leading_whitespace(&mut self) {
        let start = self
            .buffer
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .unwrap_or(self.buffer.len());
        self.buffer.drain(..start);
    }
}

const fn opens_container(byte: &u8) -> bool {
    matches!(byte, b'{' | b'[')
}

/// Bracket-matching state for a value being discarded.
#[derive(Debug, Default, Clone, Copy)]
struct Skip {
    depth: usize,
    in_string: bool,
    escaped: bool,
    discarded: usize,
}

impl Skip {
    /// State for an incomplete value dropped from the front of `bytes`.
    fn resume(bytes: &[u8]) -> Option<Self> {
        if !bytes.first().is_some_and(opens_container) {
            return None;
        }
        let mut skip = Self::default();
        match skip.scan(bytes) {
            Some(_) => None,
            None => Some(skip),
        }
    }

    /// Consumes `bytes` and returns the offset just past the closing bracket.
    fn scan(&mut self, bytes: &[u8]) -> Option<usize> {
        for (offset, byte) in bytes.iter().enumerate() {
            if self.in_string {
                match byte {
                    _ if self.escaped => self.escaped = false,
                    b'\\' => self.escaped = true,
                    b'"' => self.in_string = false,
                    _ => {}
                }
                continue;
            }
            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(offset + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;
