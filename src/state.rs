//! Core session state, separated from the front end.
//!
//! `ClientState` holds everything that represents the chat session: the
//! transcript, the roster, nick colours and what the user should currently
//! be looking at. Front ends read it to draw and feed it events and input.

use chrono::Local;
use tracing::debug;

use crate::buffer::{Message, Transcript};
use crate::colors::NickColors;
use crate::commands::{self, UserCommand};
use crate::config::Settings;
use crate::format;
use crate::input_state::outgoing_text;
use crate::logging::{LogEntry, Logger};
use crate::nickname::NicknameSource;
use crate::protocol::BackendAction;
use crate::roster::Roster;
use crate::validation;

/// Keep the system log from growing without bound
const MAX_SYSTEM_LOG: usize = 500;

/// Which page the user is looking at.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPage {
    /// Waiting for registration and the channel join
    Connecting,
    /// In the channel
    Chat,
    /// Something went wrong; shown until the app is restarted
    Error { title: String, details: String },
}

/// Result of submitting an input line.
#[derive(Debug, Default, PartialEq)]
pub struct Submission {
    pub actions: Vec<BackendAction>,
    /// The user asked to leave
    pub quit: bool,
}

/// Core session state for the chat client.
pub struct ClientState {
    pub settings: Settings,

    /// Stored NickServ password for `settings.nickname`
    pub password: Option<String>,

    nickname_source: NicknameSource,

    /// Our nickname as the server knows it
    pub nickname: String,

    /// The one channel this client lives in
    pub channel: String,

    pub roster: Roster,
    pub colors: NickColors,
    pub transcript: Transcript,
    pub status: StatusPage,

    /// Whether registration with the server completed
    pub is_connected: bool,

    /// Informational lines for the user, drained by the front end
    pub system_log: Vec<String>,

    /// Chat logger for persisting messages to disk
    pub logger: Option<Logger>,
}

impl ClientState {
    pub fn new(settings: Settings) -> Self {
        let nickname_source = NicknameSource::new(&settings.nickname);
        let nickname = nickname_source.initial();
        let channel = settings.channel.clone();

        let mut state = Self {
            settings,
            password: None,
            nickname_source,
            nickname,
            channel,
            roster: Roster::new(),
            colors: NickColors::new(),
            transcript: Transcript::new(),
            status: StatusPage::Connecting,
            is_connected: false,
            system_log: Vec::new(),
            logger: None,
        };
        state.roster.ensure_channel(&state.channel);
        let own = state.nickname.clone();
        state.colors.assign(&own);
        state
    }

    /// The action that starts the session.
    pub fn connect_action(&self) -> BackendAction {
        BackendAction::Connect {
            server: self.settings.server.clone(),
            port: self.settings.port,
            nickname: self.nickname.clone(),
            use_tls: self.settings.tls_connection,
            tls_verify: self.settings.tls_verify,
        }
    }

    /// Identify with NickServ, if an account and password are both set.
    pub fn identify_action(&self) -> Option<BackendAction> {
        let account = self.settings.nickname.trim();
        match self.password.as_deref() {
            Some(password) if !account.is_empty() && !password.is_empty() => {
                Some(BackendAction::Identify {
                    account: account.to_string(),
                    password: password.to_string(),
                })
            }
            _ => None,
        }
    }

    /// A fresh nickname after a collision.
    pub fn next_nickname(&mut self) -> String {
        self.nickname = self.nickname_source.with_random_suffix();
        let nick = self.nickname.clone();
        self.colors.assign(&nick);
        nick
    }

    /// Record a line for the user and the diagnostic log.
    pub fn print_info(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!("{}", line);
        self.system_log.push(line);
        if self.system_log.len() > MAX_SYSTEM_LOG {
            self.system_log.remove(0);
        }
    }

    /// Take the pending informational lines.
    pub fn take_system_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.system_log)
    }

    pub fn show_error_status(&mut self, title: &str, details: impl Into<String>) {
        self.status = StatusPage::Error {
            title: title.to_string(),
            details: details.into(),
        };
    }

    /// Append a chat message to the transcript. Returns whether it mentions
    /// us.
    pub fn print_message(&mut self, nick: &str, text: &str) -> bool {
        self.colors.assign(nick);
        self.transcript.push(Message::chat(nick, text.to_string()));

        if let Some(logger) = &self.logger {
            logger.log(LogEntry {
                server: self.settings.server.clone(),
                channel: self.channel.clone(),
                timestamp: Local::now().format("%H:%M:%S").to_string(),
                nick: nick.to_string(),
                message: format::strip_codes(text),
            });
        }

        nick != self.nickname && format::is_mention(text, &self.nickname)
    }

    /// Echo our own text and queue it for the channel, split to fit. Each
    /// chunk of an action is wrapped on its own.
    fn say(&mut self, echo: &str, text: &str, action: bool) -> Vec<BackendAction> {
        let own = self.nickname.clone();
        self.print_message(&own, echo);
        let text = validation::sanitize_message(&outgoing_text(text));
        let chunks: Vec<String> = if action {
            let limit = validation::MAX_MESSAGE_BYTES - format::ACTION_OVERHEAD;
            validation::split_message_within(&text, limit)
                .iter()
                .map(|chunk| format::encode_action(chunk))
                .collect()
        } else {
            validation::split_message(&text)
        };
        chunks
            .into_iter()
            .map(|chunk| BackendAction::SendMessage {
                target: self.channel.clone(),
                text: chunk,
            })
            .collect()
    }

    /// Handle one submitted input line.
    pub fn submit_line(&mut self, line: &str) -> Submission {
        let mut submission = Submission::default();
        match commands::parse_input(line, &self.nickname) {
            UserCommand::Say(text) => submission.actions = self.say(&text, &text, false),
            UserCommand::Action { local, payload } => {
                submission.actions = self.say(&local, &payload, true)
            }
            UserCommand::Nick(nick) => submission.actions.push(BackendAction::Nick(nick)),
            UserCommand::Quit(reason) => {
                submission.actions.push(BackendAction::Quit(reason));
                submission.quit = true;
            }
            UserCommand::Help => self.print_info(commands::HELP_TEXT),
            UserCommand::Invalid(reason) => self.print_info(reason),
        }
        submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ClientState {
        let settings = Settings {
            nickname: "alice".into(),
            channel: "#test".into(),
            ..Settings::default()
        };
        ClientState::new(settings)
    }

    #[test]
    fn test_client_state_new() {
        let state = state();
        assert!(!state.is_connected);
        assert_eq!(state.nickname, "alice");
        assert_eq!(state.channel, "#test");
        assert_eq!(state.status, StatusPage::Connecting);
        assert_eq!(state.colors.get("alice"), Some(crate::colors::PALETTE[0]));
    }

    #[test]
    fn test_connect_action() {
        match state().connect_action() {
            BackendAction::Connect {
                server,
                port,
                nickname,
                use_tls,
                tls_verify,
            } => {
                assert_eq!(server, "irc.libera.chat");
                assert_eq!(port, 6697);
                assert_eq!(nickname, "alice");
                assert!(use_tls);
                assert!(!tls_verify);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_identify_requires_account_and_password() {
        let mut s = state();
        assert!(s.identify_action().is_none());
        s.password = Some(String::new());
        assert!(s.identify_action().is_none());
        s.password = Some("hunter2".into());
        assert!(matches!(
            s.identify_action(),
            Some(BackendAction::Identify { ref account, ref password })
                if account == "alice" && password == "hunter2"
        ));
        s.settings.nickname.clear();
        assert!(s.identify_action().is_none());
    }

    #[test]
    fn test_next_nickname_gets_suffix_and_colour() {
        let mut s = state();
        let nick = s.next_nickname();
        assert!(nick.starts_with("alice_"));
        assert_eq!(nick.len(), "alice_".len() + 2);
        assert_eq!(s.nickname, nick);
        assert!(s.colors.get(&nick).is_some());
    }

    #[test]
    fn test_submit_plain_text() {
        let mut s = state();
        let sub = s.submit_line("hello \x16there\x16");
        assert!(!sub.quit);
        assert_eq!(
            sub.actions,
            vec![BackendAction::SendMessage {
                target: "#test".into(),
                text: "hello \x1Dthere\x1D".into(),
            }]
        );
        let last = s.transcript.last().unwrap();
        assert_eq!(last.nick.as_deref(), Some("alice"));
        assert_eq!(last.text.as_deref(), Some("hello \x16there\x16"));
    }

    #[test]
    fn test_submit_me_echoes_plain_line() {
        let mut s = state();
        let sub = s.submit_line("/me waves");
        assert_eq!(
            sub.actions,
            vec![BackendAction::SendMessage {
                target: "#test".into(),
                text: "\x01ACTION waves\x01".into(),
            }]
        );
        assert_eq!(s.transcript.last().unwrap().text.as_deref(), Some("alice waves"));
    }

    #[test]
    fn test_submit_commands() {
        let mut s = state();
        assert_eq!(
            s.submit_line("/nick bob").actions,
            vec![BackendAction::Nick("bob".into())]
        );

        let sub = s.submit_line("/quit");
        assert!(sub.quit);
        assert_eq!(
            sub.actions,
            vec![BackendAction::Quit(commands::DEFAULT_QUIT_MESSAGE.into())]
        );

        assert!(s.submit_line("/bogus").actions.is_empty());
        assert_eq!(s.take_system_log(), vec!["Unknown command: /bogus"]);
        assert!(s.system_log.is_empty());
        assert!(s.transcript.messages.is_empty());
    }

    #[test]
    fn test_long_message_is_split() {
        let mut s = state();
        let text = format!("{} {}", "a".repeat(300), "b".repeat(300));
        let sub = s.submit_line(&text);
        assert_eq!(sub.actions.len(), 2);
        assert_eq!(s.transcript.messages.len(), 1);
    }

    #[test]
    fn test_long_action_wraps_every_chunk() {
        let mut s = state();
        let sub = s.submit_line(&format!("/me {}", "word ".repeat(100)));
        assert_eq!(sub.actions.len(), 2);
        for action in &sub.actions {
            let BackendAction::SendMessage { text, .. } = action else {
                panic!("unexpected action {:?}", action);
            };
            assert!(text.len() <= validation::MAX_MESSAGE_BYTES);
            assert!(format::action_payload(text).is_some(), "broken action {:?}", text);
        }
    }

    #[test]
    fn test_mention_detection() {
        let mut s = state();
        assert!(s.print_message("bob", "alice: ping"));
        assert!(s.print_message("bob", "hey @Alice"));
        assert!(!s.print_message("bob", "malice aforethought"));
        assert!(!s.print_message("alice", "alice is here"));
    }
}
