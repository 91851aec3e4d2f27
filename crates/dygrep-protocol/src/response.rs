//! Response envelope streamed from the server to the client.

use serde::{Deserialize, Serialize};

/// A single response message.
///
/// A logical reply consists of zero or more non-final messages followed by
/// exactly one message with `lastMessage` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Payload of the message.
    pub message: ResponseMessage,
    /// Marks the terminal message of a logical reply.
    #[serde(rename = "lastMessage", default)]
    pub last_message: bool,
}

/// Payload variants carried by a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    /// Human-readable status text.
    Text(String),
    /// Buffered lines returned by a search.
    Lines {
        /// Matching lines in arrival order.
        lines: Vec<String>,
    },
    /// Snapshot of the live filter set.
    Regexes {
        /// One entry per live filter.
        regexes: Vec<RegexListing>,
    },
}

/// Listing entry for a live filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexListing {
    /// Canonical source of the compiled matcher.
    pub regex: String,
    /// Pattern text exactly as submitted.
    #[serde(rename = "str")]
    pub source: String,
}

impl Response {
    /// Builds a final text response.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: ResponseMessage::Text(message.into()),
            last_message: true,
        }
    }

    /// Builds a page of matching lines.
    #[must_use]
    pub const fn lines(lines: Vec<String>, last_message: bool) -> Self {
        Self {
            message: ResponseMessage::Lines { lines },
            last_message,
        }
    }

    /// Builds a final filter listing.
    #[must_use]
    pub const fn regexes(regexes: Vec<RegexListing>) -> Self {
        Self {
            message: ResponseMessage::Regexes { regexes },
            last_message: true,
        }
    }

    /// Returns true when this message ends its logical reply.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.last_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_response_uses_wire_field_names() {
        let encoded = serde_json::to_string(&Response::text("Added regex: a.")).expect("encode");
        assert_eq!(encoded, r#"{"message":"Added regex: a.","lastMessage":true}"#);
    }

    #[test]
    fn regex_listing_serialises_source_as_str() {
        let response = Response::regexes(vec![RegexListing {
            regex: String::from("err.*"),
            source: String::from("err.*"),
        }]);
        let encoded = serde_json::to_string(&response).expect("encode");
        assert_eq!(
            encoded,
            r#"{"message":{"regexes":[{"regex":"err.*","str":"err.*"}]},"lastMessage":true}"#
        );
    }

    #[test]
    fn payload_shapes_are_distinguished_on_decode() {
        let lines: Response =
            serde_json::from_str(r#"{"message":{"lines":["a","b"]},"lastMessage":false}"#)
                .expect("decode lines");
        assert_eq!(
            lines.message,
            ResponseMessage::Lines {
                lines: vec![String::from("a"), String::from("b")],
            }
        );
        assert!(!lines.is_final());

        let text: Response = serde_json::from_str(r#"{"message":"hi"}"#).expect("decode text");
        assert_eq!(text.message, ResponseMessage::Text(String::from("hi")));
        assert!(!text.is_final(), "missing flag defaults to false");
    }
}
