//! Queue worker loop.

use std::sync::mpsc::Receiver;

use tracing::{debug, warn};

use dygrep_protocol::Response;

use super::{QUEUE_TARGET, QueueEvent, QueuedTask};
use crate::filter::{CommandError, FilterState};
use crate::ingest::LineSink;
use crate::transport::ConnectionRegistry;

pub(super) fn run<S>(
    mut state: FilterState,
    events: &Receiver<QueueEvent>,
    ingest_slots: &Receiver<()>,
    registry: &ConnectionRegistry,
    mut sink: S,
) -> FilterState
where
    S: LineSink,
{
    while let Ok(event) = events.recv() {
        match event {
            QueueEvent::Task(task) => execute(&mut state, task, registry),
            QueueEvent::Ingest(line) => {
                display(&mut state, line, &mut sink);
                // The producer took its slot before queuing the line.
                let _ = ingest_slots.try_recv();
            }
            QueueEvent::Stop => break,
        }
    }
    debug!(target: QUEUE_TARGET, "queue worker stopped");
    state
}

fn execute(state: &mut FilterState, task: QueuedTask, registry: &ConnectionRegistry) {
    let QueuedTask { command, responder } = task;
    debug!(
        target: QUEUE_TARGET,
        connection = %responder.connection(),
        command = %command,
        "executing command"
    );
    match state.execute(&command) {
        Ok(reply) => {
            for response in reply {
                responder.respond(response);
            }
        }
        Err(error) => broadcast_failure(&error, registry),
    }
}

/// Reports a failed command to every connected client.
fn broadcast_failure(error: &CommandError, registry: &ConnectionRegistry) {
    warn!(target: QUEUE_TARGET, %error, "command failed");
    let notice = Response::text(format!("error: {error}"));
    match registry.broadcast(&notice) {
        Ok(delivered) => debug!(target: QUEUE_TARGET, delivered, "failure broadcast"),
        Err(registry_error) => {
            warn!(target: QUEUE_TARGET, error = %registry_error, "failure broadcast skipped");
        }
    }
}

fn display<S: LineSink>(state: &mut FilterState, line: String, sink: &mut S) {
    let Some(ingested) = state.ingest(line) else {
        return;
    };
    if let Err(error) = sink.display(&ingested) {
        warn!(target: QUEUE_TARGET, %error, "failed to display line");
    }
}
