//! Connection lifecycle for the interactive client.
//!
//! [`ConnectionLifecycle`] is a pure state machine: it consumes
//! [`LifecycleEvent`]s stamped with the current time and answers with the
//! [`LifecycleAction`]s the runtime must perform. Timers are deadlines held in
//! the machine; the runtime sleeps until [`ConnectionLifecycle::next_deadline`]
//! and then delivers [`LifecycleEvent::Tick`].
//!
//! Every connection attempt gets a fresh [`Generation`]. Socket events carry
//! the generation they came from, and anything from a generation other than
//! the current one is ignored, so a detached socket can never disturb its
//! successor.

mod machine;
mod types;

pub(crate) use machine::ConnectionLifecycle;
pub(crate) use types::{ExitStatus, Generation, LifecycleAction, LifecycleEvent};
#[cfg(test)]
pub(crate) use types::{ConnectionState, Notice};
