//! Bounded history of ingested lines.

use std::collections::VecDeque;

use regex::Regex;

use dygrep_config::HISTORY_CAPACITY;

/// FIFO buffer of the most recently ingested lines.
///
/// Once full, each insertion evicts the oldest line. Arrival order is kept.
#[derive(Debug)]
pub struct LineBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl LineBuffer {
    /// Creates a buffer holding at most `capacity` lines.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Appends a line, evicting the oldest when the buffer is full.
    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Lines whose lowercased text `matcher` matches, in arrival order.
    #[must_use]
    pub fn matching(&self, matcher: &Regex) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| matcher.is_match(&line.to_lowercase()))
            .cloned()
            .collect()
    }

    /// Iterates buffered lines from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of buffered lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true when nothing has been buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of lines retained.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
