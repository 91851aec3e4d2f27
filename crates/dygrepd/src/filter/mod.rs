//! Filter state owned by the command queue worker.
//!
//! [`RegexStore`] holds the live filters and [`LineBuffer`] the recent
//! history. [`FilterState`] combines them and is the only type that mutates
//! either, so whoever owns a `FilterState` owns all filter semantics.

mod errors;
mod history;
mod state;
mod store;

pub use errors::CommandError;
pub use history::LineBuffer;
pub use state::{DisplayMode, FilterState, IngestedLine};
pub use store::{RegexEntry, RegexStore};
