//! The runtime loop and the side effects it performs.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, raise};
use tracing::{debug, info, warn};

use dygrep_config::{Endpoint, SHUTDOWN_GRACE};
use dygrep_protocol::{Command, CommandRequest, Response, write_message};

use crate::command::{self, ClientCommand, KEYWORDS};
use crate::editor::{EditorEffect, KeyAction, KeyDecoder, TerminalEditor};
use crate::errors::ClientError;
use crate::lifecycle::{
    ConnectionLifecycle, ExitStatus, Generation, LifecycleAction, LifecycleEvent,
};
use crate::screen::Screen;
use crate::transport;

use super::{ClientEvent, RUNTIME_TARGET, SocketEvent};

const NOT_CONNECTED: &str = "not (yet) connected to the dygrep server";

type Flow = ControlFlow<ExitStatus, Vec<LifecycleAction>>;

/// Single owner of the client's state.
pub(crate) struct ClientRuntime<W: Write> {
    endpoint: Endpoint,
    lifecycle: ConnectionLifecycle,
    editor: TerminalEditor,
    keys: KeyDecoder,
    screen: Screen<W>,
    events_tx: Sender<ClientEvent>,
    events: Receiver<ClientEvent>,
    candidate: Option<(Generation, TcpStream)>,
    attached: Option<(Generation, TcpStream)>,
}

impl<W: Write> ClientRuntime<W> {
    pub(crate) fn new(
        endpoint: Endpoint,
        lifecycle: ConnectionLifecycle,
        screen: Screen<W>,
        (events_tx, events): (Sender<ClientEvent>, Receiver<ClientEvent>),
    ) -> Self {
        Self {
            endpoint,
            lifecycle,
            editor: TerminalEditor::default(),
            keys: KeyDecoder::default(),
            screen,
            events_tx,
            events,
            candidate: None,
            attached: None,
        }
    }

    /// Loops until the lifecycle or the user ends the session.
    pub(crate) fn run(mut self) -> ExitStatus {
        let mut actions = self.lifecycle.handle(LifecycleEvent::Start, Instant::now());
        loop {
            if let ControlFlow::Break(status) = self.perform(actions) {
                return status;
            }
            let flow = match self.next_event() {
                Some(event) => self.dispatch(event),
                None => ControlFlow::Continue(
                    self.lifecycle.handle(LifecycleEvent::Tick, Instant::now()),
                ),
            };
            actions = match flow {
                ControlFlow::Continue(actions) => actions,
                ControlFlow::Break(status) => return status,
            };
        }
    }

    /// Waits for the next event, or returns `None` when a deadline passes.
    fn next_event(&self) -> Option<ClientEvent> {
        match self.lifecycle.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match self.events.recv_timeout(wait) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
                }
            }
            // The runtime keeps a sender, so the channel never disconnects.
            None => self.events.recv().ok(),
        }
    }

    fn dispatch(&mut self, event: ClientEvent) -> Flow {
        let now = Instant::now();
        match event {
            ClientEvent::Keys(bytes) => self.on_keys(&bytes),
            ClientEvent::KeyboardClosed => {
                debug!(target: RUNTIME_TARGET, "keyboard input closed");
                ControlFlow::Continue(Vec::new())
            }
            ClientEvent::ConnectResult { generation, result } => {
                let event = match result {
                    Ok(stream) => {
                        self.candidate = Some((generation, stream));
                        LifecycleEvent::Connected { generation }
                    }
                    Err(error) => LifecycleEvent::ConnectFailed {
                        generation,
                        reason: error.to_string(),
                    },
                };
                ControlFlow::Continue(self.lifecycle.handle(event, now))
            }
            ClientEvent::Socket { generation, event } => self.on_socket(generation, event, now),
            ClientEvent::Signal(signal) => {
                debug!(target: RUNTIME_TARGET, signal, "closing after signal");
                ControlFlow::Break(self.shut_down(now))
            }
        }
    }

    /// Terminates the lifecycle and closes the socket within the grace period.
    fn shut_down(&mut self, now: Instant) -> ExitStatus {
        let stream = self.attached.take();
        let actions = self.lifecycle.handle(LifecycleEvent::Shutdown, now);
        let status = match self.perform(actions) {
            ControlFlow::Break(status) => status,
            ControlFlow::Continue(()) => ExitStatus::Success,
        };
        let closed = stream.map_or(ExitStatus::Success, |(_, stream)| {
            close_within(stream, SHUTDOWN_GRACE)
        });
        if closed == ExitStatus::Success {
            status
        } else {
            ExitStatus::Failure
        }
    }

    fn on_socket(&mut self, generation: Generation, event: SocketEvent, now: Instant) -> Flow {
        let current = self
            .attached
            .as_ref()
            .is_some_and(|(attached, _)| *attached == generation);
        match event {
            SocketEvent::Message(response) if current => {
                self.show_response(&response);
                ControlFlow::Continue(Vec::new())
            }
            SocketEvent::Garbled(reason) if current => {
                warn!(target: RUNTIME_TARGET, %generation, %reason, "undecodable server message");
                ControlFlow::Continue(Vec::new())
            }
            SocketEvent::Message(_) | SocketEvent::Garbled(_) => {
                debug!(target: RUNTIME_TARGET, %generation, "dropping message from detached socket");
                ControlFlow::Continue(Vec::new())
            }
            SocketEvent::Closed => ControlFlow::Continue(
                self.lifecycle
                    .handle(LifecycleEvent::SocketClosed { generation }, now),
            ),
            SocketEvent::Failed(reason) => ControlFlow::Continue(
                self.lifecycle
                    .handle(LifecycleEvent::SocketFailed { generation, reason }, now),
            ),
        }
    }

    fn on_keys(&mut self, bytes: &[u8]) -> Flow {
        let mut warned = false;
        for action in self.keys.decode(bytes) {
            let always_allowed = matches!(action, KeyAction::Interrupt | KeyAction::EndOfInput);
            if !always_allowed && !self.lifecycle.is_connected() {
                if !warned {
                    self.show_notice(NOT_CONNECTED);
                    warned = true;
                }
                continue;
            }
            for effect in self.editor.handle(action) {
                if let ControlFlow::Break(status) = self.apply(effect) {
                    return ControlFlow::Break(status);
                }
            }
        }
        ControlFlow::Continue(Vec::new())
    }

    fn apply(&mut self, effect: EditorEffect) -> ControlFlow<ExitStatus> {
        let written = match effect {
            EditorEffect::Echo(text) => self.screen.echo(&text),
            EditorEffect::Redraw(line) => self.screen.redraw(&line),
            EditorEffect::ShowCandidates { candidates, line } => {
                self.screen.candidates(&candidates, &line)
            }
            EditorEffect::ClearScreen(line) => self.screen.clear(&line),
            EditorEffect::Submit(line) => self.submit(&line),
            EditorEffect::Interrupt => {
                let written = self.screen.farewell("You pressed Ctrl-C. Sending SIGINT.");
                if let Err(error) = raise(Signal::SIGINT) {
                    warn!(target: RUNTIME_TARGET, %error, "failed to raise SIGINT");
                }
                written
            }
            EditorEffect::Exit => {
                report_write(self.screen.farewell("You pressed Ctrl-D. Bye!"));
                if let Some((_, stream)) = self.attached.take() {
                    close_stream(&stream);
                }
                return ControlFlow::Break(ExitStatus::Success);
            }
        };
        report_write(written);
        ControlFlow::Continue(())
    }

    fn submit(&mut self, line: &str) -> io::Result<()> {
        self.screen.submitted()?;
        match command::parse(line) {
            ClientCommand::Empty => self.screen.redraw(""),
            ClientCommand::ClearScreen => self.screen.clear(""),
            ClientCommand::Help => self.screen.help(KEYWORDS),
            ClientCommand::Unrecognized(line) => self.screen.unrecognized(&line),
            ClientCommand::Remote(command) => {
                self.screen.sending(&command)?;
                if let Err(error) = self.transmit(&command) {
                    warn!(target: RUNTIME_TARGET, %error, "command not delivered");
                }
                Ok(())
            }
        }
    }

    fn transmit(&self, command: &Command) -> Result<(), ClientError> {
        let Some((generation, stream)) = self.attached.as_ref() else {
            return Ok(());
        };
        let mut writer = stream;
        write_message(&mut writer, &CommandRequest::from(command))?;
        debug!(target: RUNTIME_TARGET, %generation, command = command.name(), "command sent");
        Ok(())
    }

    fn perform(&mut self, actions: Vec<LifecycleAction>) -> ControlFlow<ExitStatus> {
        for action in actions {
            match action {
                LifecycleAction::Connect { generation } => self.spawn_connect(generation),
                LifecycleAction::Attach { generation } => self.attach(generation),
                LifecycleAction::Detach { generation } => self.detach(generation),
                LifecycleAction::Notify(notice) => self.show_notice(&notice.to_string()),
                LifecycleAction::Exit(status) => return ControlFlow::Break(status),
            }
        }
        ControlFlow::Continue(())
    }

    fn spawn_connect(&self, generation: Generation) {
        let endpoint = self.endpoint.clone();
        let events = self.events_tx.clone();
        let spawned = thread::Builder::new()
            .name(String::from("dygrep-connect"))
            .spawn(move || {
                let result = transport::connect(&endpoint);
                let _ = events.send(ClientEvent::ConnectResult { generation, result });
            });
        if let Err(source) = spawned {
            let _ = self.events_tx.send(ClientEvent::ConnectResult {
                generation,
                result: Err(ClientError::Connect {
                    endpoint: self.endpoint.to_string(),
                    source,
                }),
            });
        }
    }

    fn attach(&mut self, generation: Generation) {
        let Some((candidate, stream)) = self.candidate.take() else {
            return;
        };
        if candidate != generation {
            close_stream(&stream);
            return;
        }
        let reader = stream.try_clone().and_then(|reader| {
            let events = self.events_tx.clone();
            thread::Builder::new()
                .name(String::from("dygrep-reader"))
                .spawn(move || transport::pump_responses(reader, generation, &events))
        });
        if let Err(error) = reader {
            let _ = self.events_tx.send(ClientEvent::Socket {
                generation,
                event: SocketEvent::Failed(error.to_string()),
            });
        }
        info!(target: RUNTIME_TARGET, %generation, endpoint = %self.endpoint, "socket attached");
        self.attached = Some((generation, stream));
    }

    fn detach(&mut self, generation: Generation) {
        for slot in [&mut self.attached, &mut self.candidate] {
            if slot.as_ref().is_some_and(|(held, _)| *held == generation) {
                if let Some((_, stream)) = slot.take() {
                    close_stream(&stream);
                }
            }
        }
    }

    fn show_notice(&mut self, text: &str) {
        report_write(self.screen.notice(text, self.editor.line()));
    }

    fn show_response(&mut self, response: &Response) {
        report_write(self.screen.response(response, self.editor.line()));
    }
}

fn close_stream(stream: &TcpStream) {
    if let Err(error) = stream.shutdown(Shutdown::Both) {
        debug!(target: RUNTIME_TARGET, %error, "socket already closed");
    }
}

/// Closes `stream` on a helper thread and waits at most `grace` for it.
fn close_within(stream: TcpStream, grace: Duration) -> ExitStatus {
    let (done_tx, done) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name(String::from("dygrep-close"))
        .spawn(move || {
            close_stream(&stream);
            let _ = done_tx.send(());
        });
    if let Err(error) = spawned {
        warn!(target: RUNTIME_TARGET, %error, "failed to spawn close thread");
        return ExitStatus::Failure;
    }
    match done.recv_timeout(grace) {
        Ok(()) => ExitStatus::Success,
        Err(_) => {
            warn!(target: RUNTIME_TARGET, ?grace, "connection close timed out");
            ExitStatus::Failure
        }
    }
}

fn report_write(result: io::Result<()>) {
    if let Err(error) = result {
        debug!(target: RUNTIME_TARGET, %error, "terminal write failed");
    }
}
