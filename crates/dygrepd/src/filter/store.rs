//! Live filter set keyed by pattern text.

use regex::Regex;

use dygrep_protocol::RegexListing;

use super::errors::CommandError;

/// A compiled filter and the text it was compiled from.
#[derive(Debug, Clone)]
pub struct RegexEntry {
    pattern: String,
    matcher: Regex,
}

impl RegexEntry {
    /// Pattern text exactly as submitted.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled matcher.
    #[must_use]
    pub const fn matcher(&self) -> &Regex {
        &self.matcher
    }

    fn listing(&self) -> RegexListing {
        RegexListing {
            regex: self.matcher.as_str().to_owned(),
            source: self.pattern.clone(),
        }
    }
}

/// Ordered set of live filters.
///
/// Keys are unique. Re-adding a pattern replaces its matcher in place, so the
/// listing order is the order in which each pattern was first added.
#[derive(Debug, Default)]
pub struct RegexStore {
    entries: Vec<RegexEntry>,
}

impl RegexStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Compiles `pattern` and inserts it, overwriting any previous matcher.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidPattern`] when the pattern does not
    /// compile; the store is left unchanged.
    pub fn add(&mut self, pattern: &str) -> Result<(), CommandError> {
        let matcher = compile(pattern)?;
        match self.entries.iter_mut().find(|entry| entry.pattern == pattern) {
            Some(entry) => entry.matcher = matcher,
            None => self.entries.push(RegexEntry {
                pattern: pattern.to_owned(),
                matcher,
            }),
        }
        Ok(())
    }

    /// Removes `pattern`; returns whether it was present.
    pub fn remove(&mut self, pattern: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.pattern != pattern);
        self.entries.len() != before
    }

    /// Drops every filter.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the live filters for a listing response.
    #[must_use]
    pub fn listing(&self) -> Vec<RegexListing> {
        self.entries.iter().map(RegexEntry::listing).collect()
    }

    /// Returns true when any live filter matches `line`.
    #[must_use]
    pub fn matches_any(&self, line: &str) -> bool {
        self.entries.iter().any(|entry| entry.matcher.is_match(line))
    }

    /// Iterates the live filters in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &RegexEntry> {
        self.entries.iter()
    }

    /// Number of live filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compiles a pattern, mapping failures onto [`CommandError`].
pub(crate) fn compile(pattern: &str) -> Result<Regex, CommandError> {
    Regex::new(pattern).map_err(|source| CommandError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}
