//! Command execution and ingest against the owned filter state.

use dygrep_config::RESULT_PAGE_LINES;
use dygrep_protocol::{Command, Response};

use super::errors::CommandError;
use super::history::LineBuffer;
use super::store::{RegexStore, compile};

/// How ingested lines reach the local display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Every line is shown; matching lines are marked.
    #[default]
    All,
    /// While any filter is active only matching lines are shown.
    OnlyMatching,
}

/// A freshly ingested line and whether a live filter matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedLine {
    /// The line as read from the source.
    pub text: String,
    /// True when at least one live filter matched.
    pub filtered: bool,
}

/// Filter set plus line history, owned by exactly one worker.
#[derive(Debug)]
pub struct FilterState {
    regexes: RegexStore,
    history: LineBuffer,
    display: DisplayMode,
    page_lines: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(LineBuffer::default(), DisplayMode::All)
    }
}

impl FilterState {
    /// Builds state around an existing history buffer.
    #[must_use]
    pub fn new(history: LineBuffer, display: DisplayMode) -> Self {
        Self {
            regexes: RegexStore::new(),
            history,
            display,
            page_lines: RESULT_PAGE_LINES,
        }
    }

    /// Overrides the number of lines per search response page.
    #[must_use]
    pub fn with_page_lines(mut self, page_lines: usize) -> Self {
        self.page_lines = page_lines.max(1);
        self
    }

    /// Live filters.
    #[must_use]
    pub const fn regexes(&self) -> &RegexStore {
        &self.regexes
    }

    /// Buffered history.
    #[must_use]
    pub const fn history(&self) -> &LineBuffer {
        &self.history
    }

    /// Executes a command and returns its reply.
    ///
    /// The reply is never empty and only its last message is final.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when a pattern or search term does not
    /// compile. The state is unchanged in that case.
    pub fn execute(&mut self, command: &Command) -> Result<Vec<Response>, CommandError> {
        let reply = match command {
            Command::List => vec![Response::regexes(self.regexes.listing())],
            Command::RemoveAll => {
                self.regexes.clear();
                vec![Response::text("Removed all regexes.")]
            }
            Command::Add(pattern) => {
                self.regexes.add(pattern)?;
                vec![Response::text(format!("Added regex: {pattern}."))]
            }
            Command::Remove(pattern) => {
                let message = if self.regexes.remove(pattern) {
                    format!("Deleted regex: {pattern}.")
                } else {
                    format!("Regex not present: {pattern}.")
                };
                vec![Response::text(message)]
            }
            Command::Search(pattern) | Command::Regex(pattern) => {
                let matcher = compile(pattern)?;
                self.paginate(self.history.matching(&matcher))
            }
            Command::Unrecognized => vec![Response::text("No matching command field was found.")],
        };
        Ok(reply)
    }

    /// Buffers a line and classifies it against the live filters.
    ///
    /// Returns `None` when the display mode suppresses the line.
    pub fn ingest(&mut self, text: String) -> Option<IngestedLine> {
        let filtered = self.regexes.matches_any(&text);
        self.history.push(text.clone());
        if self.display == DisplayMode::OnlyMatching && !self.regexes.is_empty() && !filtered {
            return None;
        }
        Some(IngestedLine { text, filtered })
    }

    fn paginate(&self, lines: Vec<String>) -> Vec<Response> {
        if lines.is_empty() {
            return vec![Response::lines(Vec::new(), true)];
        }
        let pages = lines.chunks(self.page_lines).count();
        lines
            .chunks(self.page_lines)
            .enumerate()
            .map(|(index, page)| Response::lines(page.to_vec(), index + 1 == pages))
            .collect()
    }
}
