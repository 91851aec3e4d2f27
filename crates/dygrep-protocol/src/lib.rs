//! Wire protocol shared by the `dygrep` server and client.
//!
//! Both directions carry a concatenation of self-delimited JSON objects over a
//! persistent socket. There is no length prefix and no mandatory delimiter:
//! the [`MessageDecoder`] reconstructs discrete messages purely from the
//! structural completeness of each value, so chunks may split a message at any
//! byte or carry several messages at once.
//!
//! ## Requests
//!
//! ```json
//! {"command":{"add":"err.*"}}
//! {"command":{"list":true}}
//! ```
//!
//! A request names one operation. [`CommandRequest::into_command`] turns the
//! optional-field envelope into a single [`Command`] according to a
//! [`CommandPolicy`].
//!
//! ## Responses
//!
//! ```json
//! {"message":"Added regex: err.*.","lastMessage":true}
//! {"message":{"regexes":[{"regex":"err.*","str":"err.*"}]},"lastMessage":true}
//! ```
//!
//! `lastMessage` marks the terminal reply of a logical command; the client
//! resumes prompting when it sees it.

mod decoder;
mod encode;
mod request;
mod response;

pub use decoder::{DecodeError, MAX_PENDING_BYTES, MessageDecoder};
pub use encode::{EncodeError, encode, write_message};
pub use request::{Command, CommandFields, CommandPolicy, CommandRejection, CommandRequest};
pub use response::{RegexListing, Response, ResponseMessage};
