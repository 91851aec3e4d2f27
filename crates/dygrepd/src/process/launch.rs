//! Supervises server startup, the shutdown wait, and the bounded close.

use std::io::{self, BufRead, BufReader};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use dygrep_config::{Endpoint, SHUTDOWN_GRACE, ServerArgs, telemetry};
use dygrep_protocol::CommandPolicy;

use crate::filter::{DisplayMode, FilterState, LineBuffer};
use crate::ingest::{LineSink, TerminalSink, spawn_ingest};
use crate::queue::CommandQueue;
use crate::transport::{
    CommandConnectionHandler, ConnectionRegistry, ListenerHandle, SocketListener,
};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runtime options derived from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Where to listen.
    pub endpoint: Endpoint,
    /// How multi-field requests are resolved.
    pub policy: CommandPolicy,
    /// Which ingested lines reach the display.
    pub display: DisplayMode,
}

impl From<&ServerArgs> for ServerSettings {
    fn from(args: &ServerArgs) -> Self {
        Self {
            endpoint: args.connection.endpoint(),
            policy: if args.strict_commands {
                CommandPolicy::Strict
            } else {
                CommandPolicy::Legacy
            },
            display: if args.only_matching {
                DisplayMode::OnlyMatching
            } else {
                DisplayMode::All
            },
        }
    }
}

/// Collaborators required to run the server.
pub(crate) struct LaunchPlan<R, K, S> {
    pub(crate) settings: ServerSettings,
    pub(crate) source: R,
    pub(crate) sink: K,
    pub(crate) shutdown: S,
    pub(crate) grace: Duration,
}

/// Runs the server on standard input and output until a shutdown signal.
///
/// # Errors
///
/// Returns [`LaunchError`] when startup fails or the close does not finish
/// within the shutdown grace period.
pub fn run_server(args: &ServerArgs) -> Result<(), LaunchError> {
    telemetry::initialise(&args.log_filter(), args.logging.log_format)?;
    run_server_with(LaunchPlan {
        settings: ServerSettings::from(args),
        source: BufReader::new(io::stdin()),
        sink: TerminalSink::stdout(),
        shutdown: SystemShutdownSignal,
        grace: SHUTDOWN_GRACE,
    })
}

/// Runs the server with injected collaborators.
pub(crate) fn run_server_with<R, K, S>(plan: LaunchPlan<R, K, S>) -> Result<(), LaunchError>
where
    R: BufRead + Send + 'static,
    K: LineSink,
    S: ShutdownSignal,
{
    let LaunchPlan {
        settings,
        source,
        sink,
        shutdown,
        grace,
    } = plan;
    let server = start_server(&settings, source, sink)?;
    shutdown.wait()?;
    server.close(grace)
}

/// A started server: listener, queue worker and ingest reader all running.
pub struct RunningServer {
    local_addr: Option<SocketAddr>,
    registry: ConnectionRegistry,
    listener: ListenerHandle,
    queue: CommandQueue,
}

/// Binds the listener and starts every server thread.
///
/// # Errors
///
/// Returns [`LaunchError`] when binding fails or a thread cannot start.
pub fn start_server<R, K>(
    settings: &ServerSettings,
    source: R,
    sink: K,
) -> Result<RunningServer, LaunchError>
where
    R: BufRead + Send + 'static,
    K: LineSink,
{
    info!(
        target: PROCESS_TARGET,
        endpoint = %settings.endpoint,
        policy = ?settings.policy,
        display = ?settings.display,
        "starting server"
    );
    let listener = SocketListener::bind(&settings.endpoint)?;
    let local_addr = listener.local_addr();
    let registry = ConnectionRegistry::new();
    let state = FilterState::new(LineBuffer::default(), settings.display);
    let queue = CommandQueue::start(state, registry.clone(), sink)?;
    let handler = Arc::new(CommandConnectionHandler::new(
        queue.handle(),
        registry.clone(),
        settings.policy,
    ));
    let listener = listener.start(handler)?;
    // The ingest reader blocks on its source and is left to end with the
    // process.
    spawn_ingest(source, queue.handle()).map_err(|source| LaunchError::Spawn {
        role: "ingest",
        source,
    })?;
    Ok(RunningServer {
        local_addr,
        registry,
        listener,
        queue,
    })
}

impl RunningServer {
    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stops accepting, closes connections and drains the queue.
    ///
    /// Connections still open when `grace` elapses are closed by force.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::ShutdownTimeout`] when the close overruns, or
    /// the error that interrupted it.
    pub fn close(self, grace: Duration) -> Result<(), LaunchError> {
        let registry = self.registry.clone();
        let (done_tx, done_rx) = mpsc::channel();
        thread::Builder::new()
            .name(String::from("dygrepd-close"))
            .spawn(move || {
                // The receiver may have timed out already.
                let _ = done_tx.send(self.close_now());
            })
            .map_err(|source| LaunchError::Spawn {
                role: "shutdown",
                source,
            })?;

        match done_rx.recv_timeout(grace) {
            Ok(Ok(())) => {
                info!(target: PROCESS_TARGET, "shutdown sequence completed");
                Ok(())
            }
            Ok(Err(error)) => {
                force_close(&registry);
                Err(error)
            }
            Err(_) => {
                warn!(
                    target: PROCESS_TARGET,
                    grace_ms = grace.as_millis(),
                    "graceful shutdown timed out"
                );
                force_close(&registry);
                Err(LaunchError::ShutdownTimeout { grace })
            }
        }
    }

    fn close_now(self) -> Result<(), LaunchError> {
        let Self {
            registry,
            listener,
            queue,
            ..
        } = self;
        listener.shutdown();
        listener.join()?;
        let closed = registry.close_all()?;
        info!(target: PROCESS_TARGET, closed, "connections closed");
        queue.stop()?;
        Ok(())
    }
}

fn force_close(registry: &ConnectionRegistry) {
    match registry.close_all() {
        Ok(closed) => info!(target: PROCESS_TARGET, closed, "connections closed by force"),
        Err(error) => warn!(target: PROCESS_TARGET, %error, "forced close failed"),
    }
}
