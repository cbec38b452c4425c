//! Backend event processing (registration, joins, roster changes, messages).

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::buffer::{Message, MessageKind};
use crate::protocol::{BackendAction, UiEvent};
use crate::roster::same_channel;
use crate::state::{ClientState, StatusPage};

/// What the front end has to do after a batch of events.
#[derive(Debug, Default, PartialEq)]
pub struct EventOutcome {
    /// Follow-up requests for the backend
    pub actions: Vec<BackendAction>,
    /// A channel message mentioned us
    pub mention: bool,
    /// The transcript or roster changed and should be redrawn
    pub changed: bool,
    /// Settings were modified and should be saved
    pub settings_changed: bool,
}

impl EventOutcome {
    pub fn merge(&mut self, other: EventOutcome) {
        self.actions.extend(other.actions);
        self.mention |= other.mention;
        self.changed |= other.changed;
        self.settings_changed |= other.settings_changed;
    }
}

/// Process all pending events from the backend.
pub fn process_events(event_rx: &Receiver<UiEvent>, state: &mut ClientState) -> EventOutcome {
    let mut outcome = EventOutcome::default();
    while let Ok(event) = event_rx.try_recv() {
        outcome.merge(process_event(state, event));
    }
    outcome
}

/// Apply one backend event to the session.
pub fn process_event(state: &mut ClientState, event: UiEvent) -> EventOutcome {
    let mut outcome = EventOutcome::default();

    match event {
        UiEvent::Welcome { nick } => {
            state.is_connected = true;
            if nick != state.nickname {
                state.colors.assign(&nick);
                state.nickname = nick;
            }
            outcome.actions.push(BackendAction::Join(state.channel.clone()));
        }

        UiEvent::Joined { channel, nick } => {
            state.print_info(format!("Joined channel: {} ({})", channel, nick));
            if state.roster.add(&channel, &nick) {
                state.colors.assign(&nick);
                outcome.changed = true;
            }
            if nick == state.nickname {
                state.status = StatusPage::Chat;
                if let Some(identify) = state.identify_action() {
                    state.print_info(format!("Identifying as {}...", state.settings.nickname));
                    outcome.actions.push(identify);
                }
            } else if same_channel(&channel, &state.channel) {
                state.transcript.push(Message::action(&nick, MessageKind::Join));
                outcome.changed = true;
            }
        }

        UiEvent::Names { channel, names } => {
            for name in &names {
                state.colors.assign(name);
            }
            let added = state.roster.add_names(&channel, names.iter().map(String::as_str));
            debug!(%channel, added = added.len(), "Names reply");
            outcome.changed = true;
        }

        UiEvent::Parted { channel, nick } => {
            state.print_info(format!("Part: {} left {}", nick, channel));
            state.roster.remove(&channel, &nick);
            if nick != state.nickname && same_channel(&channel, &state.channel) {
                state.transcript.push(Message::action(&nick, MessageKind::Quit));
            }
            outcome.changed = true;
        }

        UiEvent::Quit { nick, reason } => {
            state.print_info(format!(
                "Quit: {} ({})",
                nick,
                reason.as_deref().unwrap_or("no reason")
            ));
            state.roster.remove_everywhere(&nick);
            if nick != state.nickname {
                state.transcript.push(Message::action(&nick, MessageKind::Quit));
            }
            outcome.changed = true;
        }

        UiEvent::NickChanged { old, new } => {
            state.print_info(format!("Nick: {} is now {}", old, new));
            let channel = state.channel.clone();
            state.roster.rename(&channel, &old, &new);
            state.colors.assign(&new);
            if old == state.nickname {
                state.nickname = new.clone();
            }
            if new != state.nickname {
                state
                    .transcript
                    .push(Message::action(&new, MessageKind::NickChange { old }));
            }
            outcome.changed = true;
        }

        UiEvent::Message {
            target,
            sender,
            text,
        } => {
            if same_channel(&target, &state.channel) {
                outcome.mention = state.print_message(&sender, &text);
                outcome.changed = true;
            } else {
                debug!(%target, %sender, "Ignoring message outside the channel");
            }
        }

        UiEvent::Notice { sender, text } => {
            state.print_info(format!("Notice: {} {}", sender, text));
        }

        UiEvent::Raw(line) => {
            debug!(raw = %line, "Raw message");
        }

        UiEvent::ErroneousNickname(nick) => {
            state.print_info(format!("Invalid nickname: {}", nick));
            state.show_error_status(
                "Invalid nickname",
                "Your nickname was rejected. Restart the application to reset it.",
            );
            state.settings.nickname.clear();
            outcome.settings_changed = true;
        }

        UiEvent::NicknameInUse(nick) => {
            let new_nick = state.next_nickname();
            state.print_info(format!(
                "Nickname '{}' in use, switching to '{}'",
                nick, new_nick
            ));
            outcome.actions.push(BackendAction::Nick(new_nick));
        }

        UiEvent::Disconnected(reason) => {
            state.is_connected = false;
            state.print_info(format!("Disconnected from server: {}", reason));
            state.show_error_status(
                "Disconnected",
                "You have been disconnected from the server. Please try to reconnect.",
            );
        }

        UiEvent::Error(msg) => {
            warn!(error = %msg, "Backend error");
            state.show_error_status("Error", msg);
        }

        UiEvent::ServerError(msg) => {
            state.print_info(format!("Error from server: {}", msg));
            state.show_error_status("Error", format!("An error occurred: {}", msg));
        }
    }

    outcome
}
