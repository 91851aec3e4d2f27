//! The lifecycle state machine.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use dygrep_config::{RECONNECT_DELAY, WATCHDOG_TIMEOUT};

use super::types::{
    ConnectionState, ExitStatus, Generation, LifecycleAction, LifecycleEvent, Notice,
};

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Owns the single client connection's state and timers.
#[derive(Debug)]
pub(crate) struct ConnectionLifecycle {
    state: ConnectionState,
    generation: Option<Generation>,
    ever_connected: bool,
    reconnect_delay: Duration,
    watchdog_timeout: Duration,
    reconnect_at: Option<Instant>,
    watchdog_at: Option<Instant>,
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new(RECONNECT_DELAY, WATCHDOG_TIMEOUT)
    }
}

impl ConnectionLifecycle {
    pub(crate) const fn new(reconnect_delay: Duration, watchdog_timeout: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            generation: None,
            ever_connected: false,
            reconnect_delay,
            watchdog_timeout,
            reconnect_at: None,
            watchdog_at: None,
        }
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Earliest pending timer, if any.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        match (self.reconnect_at, self.watchdog_at) {
            (Some(reconnect), Some(watchdog)) => Some(reconnect.min(watchdog)),
            (reconnect, watchdog) => reconnect.or(watchdog),
        }
    }

    /// Applies `event` at time `now` and returns the resulting actions.
    pub(crate) fn handle(&mut self, event: LifecycleEvent, now: Instant) -> Vec<LifecycleAction> {
        if self.state == ConnectionState::Terminated {
            return Vec::new();
        }
        match event {
            LifecycleEvent::Start => self.start(),
            LifecycleEvent::Connected { generation } => self.connected(generation),
            LifecycleEvent::ConnectFailed { generation, reason }
            | LifecycleEvent::SocketFailed { generation, reason } => {
                self.lost(generation, Some(reason), now)
            }
            LifecycleEvent::SocketClosed { generation } => self.lost(generation, None, now),
            LifecycleEvent::Tick => self.tick(now),
            LifecycleEvent::Shutdown => self.shutdown(),
        }
    }

    fn start(&mut self) -> Vec<LifecycleAction> {
        if self.state != ConnectionState::Disconnected {
            return Vec::new();
        }
        vec![self.begin_attempt()]
    }

    fn connected(&mut self, generation: Generation) -> Vec<LifecycleAction> {
        if !self.is_current(generation) || self.state != ConnectionState::Connecting {
            debug!(target: LIFECYCLE_TARGET, %generation, "ignoring stale connection");
            return Vec::new();
        }
        self.state = ConnectionState::Connected;
        self.watchdog_at = None;
        let notice = if self.ever_connected {
            Notice::Reconnected
        } else {
            Notice::Connected
        };
        self.ever_connected = true;
        info!(target: LIFECYCLE_TARGET, %generation, "connected to server");
        vec![
            LifecycleAction::Attach { generation },
            LifecycleAction::Notify(notice),
        ]
    }

    fn lost(
        &mut self,
        generation: Generation,
        reason: Option<String>,
        now: Instant,
    ) -> Vec<LifecycleAction> {
        let live = matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        );
        if !self.is_current(generation) || !live {
            debug!(target: LIFECYCLE_TARGET, %generation, "ignoring event from detached socket");
            return Vec::new();
        }
        warn!(
            target: LIFECYCLE_TARGET,
            %generation,
            reason = reason.as_deref().unwrap_or("end of stream"),
            "connection lost"
        );
        self.state = ConnectionState::Reconnecting;
        self.reconnect_at = Some(now + self.reconnect_delay);
        vec![
            LifecycleAction::Detach { generation },
            LifecycleAction::Notify(Notice::Disconnected { reason }),
        ]
    }

    fn tick(&mut self, now: Instant) -> Vec<LifecycleAction> {
        if self.watchdog_at.is_some_and(|deadline| deadline <= now) {
            warn!(target: LIFECYCLE_TARGET, "reconnect watchdog expired");
            let mut actions = self.terminate();
            actions.push(LifecycleAction::Notify(Notice::GaveUp));
            actions.push(LifecycleAction::Exit(ExitStatus::Failure));
            return actions;
        }
        if self.reconnect_at.is_some_and(|deadline| deadline <= now) {
            self.reconnect_at = None;
            // A watchdog armed by an earlier retry keeps its original deadline.
            self.watchdog_at.get_or_insert(now + self.watchdog_timeout);
            return vec![self.begin_attempt()];
        }
        Vec::new()
    }

    fn shutdown(&mut self) -> Vec<LifecycleAction> {
        let mut actions = self.terminate();
        actions.push(LifecycleAction::Exit(ExitStatus::Success));
        actions
    }

    /// Moves to `Terminated`, detaching a live socket first.
    fn terminate(&mut self) -> Vec<LifecycleAction> {
        let detach = match (self.state, self.generation) {
            (ConnectionState::Connecting | ConnectionState::Connected, Some(generation)) => {
                vec![LifecycleAction::Detach { generation }]
            }
            _ => Vec::new(),
        };
        self.state = ConnectionState::Terminated;
        self.reconnect_at = None;
        self.watchdog_at = None;
        detach
    }

    fn begin_attempt(&mut self) -> LifecycleAction {
        let generation = self.generation.map_or_else(Generation::first, Generation::next);
        self.generation = Some(generation);
        self.state = ConnectionState::Connecting;
        debug!(target: LIFECYCLE_TARGET, %generation, "connection attempt started");
        LifecycleAction::Connect { generation }
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.generation == Some(generation)
    }
}
