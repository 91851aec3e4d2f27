//! Registry of live client connections.
//!
//! The registry encapsulates the `Arc<Mutex<...>>` locking pattern so the
//! queue worker can broadcast to every client and the shutdown path can force
//! sockets closed without either touching the lock directly.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use tracing::debug;

use dygrep_protocol::Response;

use super::{LISTENER_TARGET, RegistryError};

/// Identifier assigned to each accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "conn-{}", self.0)
    }
}

#[derive(Debug)]
struct ConnectionRecord {
    peer: String,
    outbound: Sender<Response>,
    socket: Option<TcpStream>,
}

#[derive(Debug, Default)]
struct Connections {
    next_id: u64,
    records: BTreeMap<ConnectionId, ConnectionRecord>,
}

/// Shared, cloneable view of the live connections.
#[derive(Clone, Debug, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<Connections>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection and returns its identifier.
    ///
    /// `socket` is a handle used only to force the connection closed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn register(
        &self,
        peer: impl Into<String>,
        outbound: Sender<Response>,
        socket: Option<TcpStream>,
    ) -> Result<ConnectionId, RegistryError> {
        let peer = peer.into();
        self.with_connections(|connections| {
            let id = ConnectionId(connections.next_id);
            connections.next_id += 1;
            debug!(target: LISTENER_TARGET, connection = %id, %peer, "connection registered");
            connections.records.insert(
                id,
                ConnectionRecord {
                    peer,
                    outbound,
                    socket,
                },
            );
            id
        })
    }

    /// Forgets a connection; returns whether it was registered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn unregister(&self, id: ConnectionId) -> Result<bool, RegistryError> {
        self.with_connections(|connections| {
            let removed = connections.records.remove(&id);
            if let Some(record) = &removed {
                debug!(
                    target: LISTENER_TARGET,
                    connection = %id,
                    peer = %record.peer,
                    "connection unregistered"
                );
            }
            removed.is_some()
        })
    }

    /// Queues `response` for every registered connection.
    ///
    /// Returns the number of connections that accepted the message.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn broadcast(&self, response: &Response) -> Result<usize, RegistryError> {
        self.with_connections(|connections| {
            connections
                .records
                .values()
                .filter(|record| record.outbound.send(response.clone()).is_ok())
                .count()
        })
    }

    /// Shuts down every registered socket and empties the registry.
    ///
    /// Returns the number of connections closed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn close_all(&self) -> Result<usize, RegistryError> {
        self.with_connections(|connections| {
            let records = std::mem::take(&mut connections.records);
            for (id, record) in &records {
                if let Some(socket) = &record.socket
                    && let Err(error) = socket.shutdown(Shutdown::Both)
                {
                    debug!(target: LISTENER_TARGET, connection = %id, %error, "socket already closed");
                }
            }
            records.len()
        })
    }

    /// Number of registered connections.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn len(&self) -> Result<usize, RegistryError> {
        self.with_connections(|connections| connections.records.len())
    }

    fn with_connections<F, R>(&self, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&mut Connections) -> R,
    {
        let mut guard = self.inner.lock().map_err(|_| RegistryError::Poisoned)?;
        Ok(f(&mut guard))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn registry() -> ConnectionRegistry {
        ConnectionRegistry::new()
    }

    #[rstest]
    fn broadcast_reaches_every_registered_connection(registry: ConnectionRegistry) {
        let (first_tx, first_rx) = mpsc::channel();
        let (second_tx, second_rx) = mpsc::channel();
        registry.register("a", first_tx, None).expect("register");
        registry.register("b", second_tx, None).expect("register");

        let delivered = registry.broadcast(&Response::text("error: boom")).expect("broadcast");

        assert_eq!(delivered, 2);
        assert_eq!(first_rx.try_recv().ok(), Some(Response::text("error: boom")));
        assert_eq!(second_rx.try_recv().ok(), Some(Response::text("error: boom")));
    }

    #[rstest]
    fn unregistered_connections_stop_receiving(registry: ConnectionRegistry) {
        let (tx, rx) = mpsc::channel();
        let id = registry.register("a", tx, None).expect("register");

        assert!(registry.unregister(id).expect("unregister"));
        assert!(!registry.unregister(id).expect("second unregister"));

        let delivered = registry.broadcast(&Response::text("x")).expect("broadcast");
        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[rstest]
    fn identifiers_are_unique(registry: ConnectionRegistry) {
        let (tx, _rx) = mpsc::channel();
        let first = registry.register("a", tx.clone(), None).expect("register");
        let second = registry.register("b", tx, None).expect("register");
        assert_ne!(first, second);
        assert_eq!(registry.len().expect("len"), 2);
    }

    #[rstest]
    fn close_all_empties_registry(registry: ConnectionRegistry) {
        let (tx, _rx) = mpsc::channel();
        registry.register("a", tx, None).expect("register");

        assert_eq!(registry.close_all().expect("close"), 1);
        assert_eq!(registry.len().expect("len"), 0);
    }
}
