//! Submitted-line history with draft-preserving rotation.

/// Previously submitted lines, most recent last.
#[derive(Debug, Default)]
pub(crate) struct CommandHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
    draft: String,
}

impl CommandHistory {
    pub(crate) fn push(&mut self, entry: String) {
        self.entries.push(entry);
        self.reset();
    }

    /// Ends any rotation in progress.
    pub(crate) fn reset(&mut self) {
        self.cursor = None;
        self.draft.clear();
    }

    /// Steps towards older entries.
    ///
    /// The first step remembers `current` as the draft; stepping past the
    /// oldest entry stays on it.
    pub(crate) fn previous(&mut self, current: &str) -> Option<&str> {
        let cursor = match self.cursor {
            None if self.entries.is_empty() => return None,
            None => {
                self.draft = current.to_owned();
                self.entries.len() - 1
            }
            Some(cursor) => cursor.saturating_sub(1),
        };
        self.cursor = Some(cursor);
        self.entries.get(cursor).map(String::as_str)
    }

    /// Steps towards newer entries, ending at the saved draft.
    pub(crate) fn next(&mut self) -> Option<String> {
        let cursor = self.cursor?;
        if cursor + 1 < self.entries.len() {
            self.cursor = Some(cursor + 1);
            return self.entries.get(cursor + 1).cloned();
        }
        self.cursor = None;
        Some(std::mem::take(&mut self.draft))
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[String] {
        &self.entries
    }
}
