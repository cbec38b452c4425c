//! Input state management for message composition, history, and tab completion.

use crate::format;

/// Formatting shortcuts available while typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKey {
    /// Ctrl+B
    Bold,
    /// Ctrl+I
    Italic,
    /// Ctrl+U
    Underline,
    /// Ctrl+S
    Strikethrough,
}

impl FormatKey {
    /// Control code inserted for this shortcut. Italics use `\x16` while
    /// typing; it is rewritten to `\x1D` when the message is sent.
    pub fn code(self) -> char {
        match self {
            FormatKey::Bold => format::BOLD,
            FormatKey::Italic => format::ITALIC_ALT,
            FormatKey::Underline => format::UNDERLINE,
            FormatKey::Strikethrough => format::STRIKETHROUGH,
        }
    }

    /// Shortcut for a Ctrl+letter chord.
    pub fn from_ctrl(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'b' => Some(FormatKey::Bold),
            'i' => Some(FormatKey::Italic),
            'u' => Some(FormatKey::Underline),
            's' => Some(FormatKey::Strikethrough),
            _ => None,
        }
    }
}

/// Text as it goes on the wire: italics rewritten to the standard code.
pub fn outgoing_text(text: &str) -> String {
    text.replace(format::ITALIC_ALT, &format::ITALIC.to_string())
}

fn common_prefix<'a>(words: &[&'a str]) -> &'a str {
    let Some(first) = words.first() else {
        return "";
    };
    let mut end = first.len();
    for w in &words[1..] {
        end = first
            .char_indices()
            .zip(w.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(end);
    }
    &first[..end]
}

/// Composition line state.
#[derive(Default, Debug)]
pub struct InputState {
    /// Current message being composed
    pub message_input: String,

    /// Submitted lines, oldest first
    pub history: Vec<String>,

    /// Current position in history (None = not navigating)
    pub history_pos: Option<usize>,

    /// Saved input when entering history mode
    pub history_saved_input: Option<String>,

    /// Whether the previous key press was Tab
    last_key_was_tab: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole line, as typing does.
    pub fn set_text(&mut self, text: &str) {
        self.message_input = text.to_string();
        self.last_key_was_tab = false;
    }

    /// Append the control code for a formatting shortcut.
    pub fn insert_format(&mut self, key: FormatKey) {
        self.message_input.push(key.code());
        self.last_key_was_tab = false;
    }

    /// Tab pressed: complete a nickname at the start of an otherwise empty
    /// line.
    ///
    /// With one candidate the line becomes `nick: `. With several, the
    /// common prefix is inserted, and a second Tab in a row appends `: `.
    pub fn complete(&mut self, nicks: &[String]) {
        let text = self.message_input.clone();
        if text.is_empty() || text.contains(' ') {
            return;
        }

        let matches: Vec<&str> = nicks
            .iter()
            .map(String::as_str)
            .filter(|n| n.starts_with(&text))
            .collect();

        if !matches.is_empty() {
            let prefix = common_prefix(&matches);
            self.message_input = if matches.len() == 1 || self.last_key_was_tab {
                format!("{}: ", prefix)
            } else {
                prefix.to_string()
            };
        }
        self.last_key_was_tab = true;
    }

    /// Enter pressed: take the trimmed line, if any, and clear the input.
    pub fn submit(&mut self) -> Option<String> {
        self.last_key_was_tab = false;
        let line = self.message_input.trim().to_string();
        if line.is_empty() {
            return None;
        }
        self.message_input.clear();
        self.history.push(line.clone());
        self.history_pos = None;
        self.history_saved_input = None;
        Some(line)
    }

    /// Navigate up in history.
    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }

        match self.history_pos {
            None => {
                self.history_saved_input = Some(self.message_input.clone());
                self.history_pos = Some(self.history.len() - 1);
            }
            Some(pos) if pos > 0 => self.history_pos = Some(pos - 1),
            Some(_) => {}
        }

        if let Some(h) = self.history_pos.and_then(|pos| self.history.get(pos)) {
            self.message_input = h.clone();
        }
    }

    /// Navigate down in history.
    pub fn history_down(&mut self) {
        if let Some(pos) = self.history_pos {
            if pos + 1 < self.history.len() {
                self.history_pos = Some(pos + 1);
                self.message_input = self.history[pos + 1].clone();
            } else {
                self.history_pos = None;
                self.message_input = self.history_saved_input.take().unwrap_or_default();
            }
        }
    }
}
