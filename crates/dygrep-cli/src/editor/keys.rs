//! Raw keyboard bytes to logical key actions.

/// A logical key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Backspace,
    Enter,
    Tab,
    Interrupt,
    EndOfInput,
    ClearScreen,
    HistoryPrevious,
    HistoryNext,
    /// Text to insert verbatim.
    Insert(String),
}

const ESCAPE: u8 = 0x1b;

enum Scan {
    Key(KeyAction, usize),
    Text,
    Incomplete,
}

/// Stateful decoder for raw-mode terminal input.
///
/// Escape sequences and UTF-8 characters split across reads are held until
/// the rest arrives.
#[derive(Debug, Default)]
pub(crate) struct KeyDecoder {
    pending: Vec<u8>,
}

impl KeyDecoder {
    pub(crate) fn decode(&mut self, chunk: &[u8]) -> Vec<KeyAction> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut actions = Vec::new();
        let mut text = Vec::new();
        let mut index = 0;
        while index < bytes.len() {
            match scan(&bytes[index..]) {
                Scan::Key(action, width) => {
                    flush_text(&mut text, &mut actions);
                    actions.push(action);
                    index += width;
                }
                Scan::Text => {
                    text.push(bytes[index]);
                    index += 1;
                }
                Scan::Incomplete => break,
            }
        }

        let mut held = text.split_off(complete_utf8_len(&text));
        flush_text(&mut text, &mut actions);
        held.extend_from_slice(&bytes[index..]);
        self.pending = held;
        actions
    }
}

fn scan(bytes: &[u8]) -> Scan {
    let Some(&first) = bytes.first() else {
        return Scan::Incomplete;
    };
    match first {
        0x7f | 0x08 => Scan::Key(KeyAction::Backspace, 1),
        b'\r' | b'\n' => Scan::Key(KeyAction::Enter, 1),
        b'\t' => Scan::Key(KeyAction::Tab, 1),
        0x03 => Scan::Key(KeyAction::Interrupt, 1),
        0x04 => Scan::Key(KeyAction::EndOfInput, 1),
        0x0c => Scan::Key(KeyAction::ClearScreen, 1),
        ESCAPE => scan_escape(bytes),
        _ => Scan::Text,
    }
}

fn scan_escape(bytes: &[u8]) -> Scan {
    match (bytes.get(1), bytes.get(2)) {
        (None, _) | (Some(b'[' | b'O'), None) => Scan::Incomplete,
        (Some(b'[' | b'O'), Some(b'A')) => Scan::Key(KeyAction::HistoryPrevious, 3),
        (Some(b'[' | b'O'), Some(b'B')) => Scan::Key(KeyAction::HistoryNext, 3),
        _ => Scan::Text,
    }
}

/// Length of the prefix of `text` that does not end inside a character.
fn complete_utf8_len(text: &[u8]) -> usize {
    match std::str::from_utf8(text) {
        Err(error) if error.error_len().is_none() => error.valid_up_to(),
        _ => text.len(),
    }
}

fn flush_text(text: &mut Vec<u8>, actions: &mut Vec<KeyAction>) {
    if text.is_empty() {
        return;
    }
    actions.push(KeyAction::Insert(String::from_utf8_lossy(text).into_owned()));
    text.clear();
}
