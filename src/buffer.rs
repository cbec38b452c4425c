use chrono::{DateTime, Local};

/// Maximum messages to keep in the transcript before trimming
const MAX_BUFFER_MESSAGES: usize = 2000;
/// Number of oldest messages to remove when trimming
const BUFFER_TRIM_COUNT: usize = 500;

#[derive(Clone, Debug, PartialEq)]
pub enum MessageKind {
    /// Something someone said; `text` holds the raw IRC text
    Chat,
    Join,
    /// Part or quit, both shown as leaving the channel
    Quit,
    NickChange { old: String },
    /// "New messages below" marker
    Separator,
}

/// One transcript entry
#[derive(Clone, Debug)]
pub struct Message {
    pub nick: Option<String>,
    pub text: Option<String>,
    pub time: DateTime<Local>,
    pub kind: MessageKind,
}

impl Message {
    pub fn chat(nick: &str, text: String) -> Self {
        Self {
            nick: Some(nick.to_string()),
            text: Some(text),
            time: Local::now(),
            kind: MessageKind::Chat,
        }
    }

    pub fn action(nick: &str, kind: MessageKind) -> Self {
        Self {
            nick: Some(nick.to_string()),
            text: None,
            time: Local::now(),
            kind,
        }
    }

    fn separator() -> Self {
        Self {
            nick: None,
            text: None,
            time: Local::now(),
            kind: MessageKind::Separator,
        }
    }

    pub fn at(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    pub fn is_chat(&self) -> bool {
        self.kind == MessageKind::Chat
    }
}

/// The channel transcript plus "new messages while scrolled up" bookkeeping.
#[derive(Clone, Debug)]
pub struct Transcript {
    pub messages: Vec<Message>,
    /// Chat messages received so far (never decreases)
    pub n_real_messages: usize,
    /// Entries pushed so far, separators excluded
    total_pushed: usize,
    /// Value of `n_real_messages` when the viewer last left the bottom
    queue_start: Option<usize>,
    /// Whether the viewer is following the newest messages
    at_bottom: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            n_real_messages: 0,
            total_pushed: 0,
            queue_start: None,
            at_bottom: true,
        }
    }

    /// Append an entry. Chat entries count as real messages and take part in
    /// the scrollback queue.
    pub fn push(&mut self, msg: Message) {
        let is_chat = msg.is_chat();
        self.messages.push(msg);
        self.total_pushed += 1;
        if is_chat {
            self.n_real_messages += 1;
            if !self.at_bottom && self.queue_start.is_none() {
                self.start_queue();
            }
        }
        if self.messages.len() > MAX_BUFFER_MESSAGES {
            self.messages.drain(0..BUFFER_TRIM_COUNT);
        }
    }

    /// Put a separator right before the newest message, replacing any
    /// earlier one.
    fn start_queue(&mut self) {
        self.queue_start = Some(self.n_real_messages - 1);
        self.messages.retain(|m| m.kind != MessageKind::Separator);
        let pos = self.messages.len().saturating_sub(1);
        self.messages.insert(pos, Message::separator());
    }

    /// The viewer scrolled away from, or back to, the newest message.
    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        self.at_bottom = at_bottom;
        if at_bottom {
            self.queue_start = None;
        }
    }

    /// "Return to bottom" button: clears the queue.
    pub fn return_to_bottom(&mut self) {
        self.set_at_bottom(true);
    }

    /// Chat messages received since the viewer left the bottom.
    pub fn queued_count(&self) -> usize {
        self.queue_start
            .map(|start| self.n_real_messages - start)
            .unwrap_or(0)
    }

    /// Label for the return-to-bottom button, if one should be shown.
    pub fn queued_label(&self) -> Option<String> {
        match self.queued_count() {
            0 => None,
            1 => Some("1 new message".to_string()),
            n => Some(format!("{} new messages", n)),
        }
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn total_pushed(&self) -> usize {
        self.total_pushed
    }

    /// The newest `n` entries in order, separators skipped.
    pub fn recent(&self, n: usize) -> Vec<&Message> {
        let mut recent: Vec<&Message> = self
            .messages
            .iter()
            .rev()
            .filter(|m| m.kind != MessageKind::Separator)
            .take(n)
            .collect();
        recent.reverse();
        recent
    }
}
