use std::io;

use thiserror::Error;

/// Errors raised by the command queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The worker has stopped and accepts no more events.
    #[error("command queue is closed")]
    Closed,
    /// The worker thread could not be spawned.
    #[error("failed to spawn command queue worker: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    /// The worker thread panicked.
    #[error("command queue worker panicked")]
    WorkerPanicked,
}
