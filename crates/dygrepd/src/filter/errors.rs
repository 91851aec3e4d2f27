//! Errors raised while executing queued commands.

use thiserror::Error;

/// Failure of a single queued command.
///
/// These never stop the queue; the worker broadcasts them and moves on.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The supplied text is not a valid regular expression.
    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
