//! TCP transport for client connections.
//!
//! The listener accepts connections on a background thread, each connection
//! is served by [`CommandConnectionHandler`], and the
//! [`ConnectionRegistry`] tracks live connections for broadcasts and forced
//! shutdown.

mod errors;
mod handler;
mod listener;
mod registry;
#[cfg(test)]
mod test_utils;

pub use self::errors::{ListenerError, RegistryError};
pub(crate) use self::handler::{CommandConnectionHandler, ConnectionHandler};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub use self::registry::{ConnectionId, ConnectionRegistry};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
