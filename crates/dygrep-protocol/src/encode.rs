//! Message framing for outbound values.

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

/// Errors raised while writing a message.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value could not be serialised.
    #[error("failed to serialise message: {0}")]
    Serialise(#[from] serde_json::Error),
    /// The writer rejected the bytes.
    #[error("failed to write message: {0}")]
    Io(#[from] io::Error),
}

/// Serialises a message as compact JSON followed by a newline.
///
/// The newline is inter-value whitespace; decoders do not depend on it.
///
/// # Errors
///
/// Returns the serialiser error when the value cannot be represented as JSON.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes a single framed message and flushes the writer.
///
/// # Errors
///
/// Returns [`EncodeError`] when serialisation, writing, or flushing fails.
pub fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), EncodeError>
where
    W: Write,
    T: Serialize,
{
    let bytes = encode(message)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Response;

    #[test]
    fn encoded_messages_end_with_newline() {
        let bytes = encode(&Response::text("ok")).expect("encode");
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(
            bytes.iter().filter(|byte| **byte == b'\n').count(),
            1,
            "compact JSON carries no embedded newline"
        );
    }

    #[test]
    fn write_message_flushes_into_writer() {
        let mut output = Vec::new();
        write_message(&mut output, &Response::text("ok")).expect("write");
        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(text, "{\"message\":\"ok\",\"lastMessage\":true}\n");
    }
}
