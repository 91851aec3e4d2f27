//! Line editing over raw keystrokes.
//!
//! [`KeyDecoder`] turns raw bytes into [`KeyAction`]s and [`TerminalEditor`]
//! applies them to the current line, answering with [`EditorEffect`]s for the
//! screen and the runtime. Neither touches the terminal directly.

mod history;
mod keys;

pub(crate) use history::CommandHistory;
pub(crate) use keys::{KeyAction, KeyDecoder};

use crate::command::KEYWORDS;

/// What the runtime must do after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditorEffect {
    /// Echo inserted text after the cursor.
    Echo(String),
    /// Redraw the prompt followed by this line.
    Redraw(String),
    /// A line was submitted for parsing.
    Submit(String),
    /// Show completion candidates, then redraw the prompt and this line.
    ShowCandidates {
        candidates: Vec<&'static str>,
        line: String,
    },
    /// Clear the screen, then redraw the prompt and this line.
    ClearScreen(String),
    /// Raise an interrupt on the own process.
    Interrupt,
    /// Leave immediately with success.
    Exit,
}

/// Current line plus history.
#[derive(Debug)]
pub(crate) struct TerminalEditor {
    line: String,
    history: CommandHistory,
    keywords: &'static [&'static str],
}

impl Default for TerminalEditor {
    fn default() -> Self {
        Self::with_keywords(KEYWORDS)
    }
}

impl TerminalEditor {
    pub(crate) fn with_keywords(keywords: &'static [&'static str]) -> Self {
        Self {
            line: String::new(),
            history: CommandHistory::default(),
            keywords,
        }
    }

    pub(crate) fn line(&self) -> &str {
        &self.line
    }

    #[cfg(test)]
    pub(crate) const fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub(crate) fn handle(&mut self, action: KeyAction) -> Vec<EditorEffect> {
        match action {
            KeyAction::Backspace => {
                self.line.pop();
                vec![self.redraw()]
            }
            KeyAction::Enter => vec![EditorEffect::Submit(self.submit())],
            KeyAction::Tab => vec![self.complete()],
            KeyAction::Interrupt => vec![EditorEffect::Interrupt],
            KeyAction::EndOfInput => vec![EditorEffect::Exit],
            KeyAction::ClearScreen => vec![EditorEffect::ClearScreen(self.line.clone())],
            KeyAction::HistoryPrevious => match self.history.previous(&self.line) {
                Some(entry) => {
                    self.line = entry.to_owned();
                    vec![self.redraw()]
                }
                None => Vec::new(),
            },
            KeyAction::HistoryNext => match self.history.next() {
                Some(entry) => {
                    self.line = entry;
                    vec![self.redraw()]
                }
                None => Vec::new(),
            },
            KeyAction::Insert(text) => {
                self.line.push_str(&text);
                vec![EditorEffect::Echo(text)]
            }
        }
    }

    fn submit(&mut self) -> String {
        let submitted = std::mem::take(&mut self.line);
        if submitted.is_empty() {
            self.history.reset();
        } else {
            self.history.push(submitted.clone());
        }
        submitted
    }

    fn complete(&mut self) -> EditorEffect {
        let candidates: Vec<&'static str> = self
            .keywords
            .iter()
            .copied()
            .filter(|keyword| keyword.starts_with(self.line.as_str()))
            .collect();
        if let [only] = candidates.as_slice() {
            self.line = (*only).to_owned();
            return self.redraw();
        }
        EditorEffect::ShowCandidates {
            candidates,
            line: self.line.clone(),
        }
    }

    fn redraw(&self) -> EditorEffect {
        EditorEffect::Redraw(self.line.clone())
    }
}

#[cfg(test)]
mod tests;
