//! Single-owner command queue.
//!
//! One worker thread owns the [`FilterState`] and drains a FIFO channel of
//! [`QueueEvent`]s. Client commands and ingested lines travel through the
//! same channel, so commands run one at a time in arrival order and every
//! line is classified against the filter set as of the last command ahead of
//! it.
//!
//! Ingest is bounded: each queued line holds one of [`INGEST_BACKLOG`] slots
//! until the worker has displayed it, so a fast source blocks its reader
//! rather than growing the queue. Commands never wait for a slot.

mod errors;
mod worker;

use std::sync::mpsc::{self, Sender, SyncSender};
use std::thread;

use tracing::debug;

use dygrep_config::INGEST_BACKLOG;
use dygrep_protocol::{Command, Response};

use crate::filter::FilterState;
use crate::ingest::LineSink;
use crate::transport::{ConnectionId, ConnectionRegistry};

pub use self::errors::QueueError;

pub(crate) const QUEUE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::queue");

/// Work items consumed by the queue worker.
#[derive(Debug)]
pub enum QueueEvent {
    /// A client command awaiting execution.
    Task(QueuedTask),
    /// A line read from the ingest source.
    Ingest(String),
    /// Stops the worker after everything queued ahead of it.
    Stop,
}

/// A command paired with the connection that asked for it.
#[derive(Debug)]
pub struct QueuedTask {
    /// The command to execute.
    pub command: Command,
    /// Where the reply goes.
    pub responder: Responder,
}

/// Reply channel for one connection.
#[derive(Debug, Clone)]
pub struct Responder {
    connection: ConnectionId,
    outbound: Sender<Response>,
}

impl Responder {
    /// Wraps the outbound channel of `connection`.
    #[must_use]
    pub const fn new(connection: ConnectionId, outbound: Sender<Response>) -> Self {
        Self {
            connection,
            outbound,
        }
    }

    /// Connection this responder writes to.
    #[must_use]
    pub const fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Queues a message for the connection.
    ///
    /// Delivery is best effort: a client that has gone away simply misses
    /// the reply.
    pub fn respond(&self, response: Response) {
        if self.outbound.send(response).is_err() {
            debug!(
                target: QUEUE_TARGET,
                connection = %self.connection,
                "reply dropped for closed connection"
            );
        }
    }
}

/// Cloneable handle used to enqueue work.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    events: Sender<QueueEvent>,
    ingest_slots: SyncSender<()>,
}

impl QueueHandle {
    /// Appends a command to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] once the worker has stopped.
    pub fn submit(&self, command: Command, responder: Responder) -> Result<(), QueueError> {
        self.send(QueueEvent::Task(QueuedTask { command, responder }))
    }

    /// Appends an ingested line to the queue.
    ///
    /// Blocks while the ingest backlog is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] once the worker has stopped.
    pub fn ingest(&self, line: String) -> Result<(), QueueError> {
        self.ingest_slots
            .send(())
            .map_err(|_| QueueError::Closed)?;
        self.send(QueueEvent::Ingest(line))
    }

    fn send(&self, event: QueueEvent) -> Result<(), QueueError> {
        self.events.send(event).map_err(|_| QueueError::Closed)
    }
}

/// Running queue worker.
#[derive(Debug)]
pub struct CommandQueue {
    handle: QueueHandle,
    worker: Option<thread::JoinHandle<FilterState>>,
}

impl CommandQueue {
    /// Spawns the worker thread that owns `state`.
    ///
    /// Command failures are broadcast through `registry`; lines that survive
    /// the display mode go to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Spawn`] when the thread cannot be created.
    pub fn start<S>(
        state: FilterState,
        registry: ConnectionRegistry,
        sink: S,
    ) -> Result<Self, QueueError>
    where
        S: LineSink,
    {
        Self::with_backlog(state, registry, sink, INGEST_BACKLOG)
    }

    /// Like [`CommandQueue::start`] with room for `backlog` pending lines.
    ///
    /// A zero backlog is raised to one.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Spawn`] when the thread cannot be created.
    pub fn with_backlog<S>(
        state: FilterState,
        registry: ConnectionRegistry,
        sink: S,
        backlog: usize,
    ) -> Result<Self, QueueError>
    where
        S: LineSink,
    {
        let (events, receiver) = mpsc::channel();
        let (ingest_slots, taken) = mpsc::sync_channel(backlog.max(1));
        let worker = thread::Builder::new()
            .name(String::from("dygrepd-queue"))
            .spawn(move || worker::run(state, &receiver, &taken, &registry, sink))
            .map_err(|source| QueueError::Spawn { source })?;
        Ok(Self {
            handle: QueueHandle {
                events,
                ingest_slots,
            },
            worker: Some(worker),
        })
    }

    /// Returns a handle for producers.
    #[must_use]
    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// Stops the worker once earlier events are processed and returns the
    /// final state.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::WorkerPanicked`] if the worker thread panicked.
    pub fn stop(mut self) -> Result<FilterState, QueueError> {
        // A closed channel means the worker is already gone; join reports why.
        let _ = self.handle.send(QueueEvent::Stop);
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| QueueError::WorkerPanicked),
            None => Err(QueueError::Closed),
        }
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.send(QueueEvent::Stop);
            let _ = worker.join();
        }
    }
}
