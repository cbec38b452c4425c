//! IRC message routing and backend action handling
//!
//! `route_message` turns incoming server lines into front-end events and is
//! kept free of I/O so it can be tested directly. `handle_backend_action`
//! executes front-end requests against the transport.

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use super::connection::{self, Transport};
use crate::protocol::{BackendAction, UiEvent};
use crate::roster::strip_mode_prefix;
use crate::wire::IrcMessage;

const REALNAME: &str = "Jargonaut";

/// Connection state owned by the backend thread.
pub struct Session {
    pub transport: Option<Transport>,
    pub current_nick: String,
    pub debug: bool,
}

impl Session {
    pub fn new(debug: bool) -> Self {
        Self {
            transport: None,
            current_nick: String::new(),
            debug,
        }
    }
}

/// Route an IRC message to front-end events.
///
/// Returns `Some(new_nick)` if the message changed our own nickname.
pub fn route_message(
    msg: &IrcMessage,
    current_nick: &str,
    event_tx: &Sender<UiEvent>,
) -> Option<String> {
    let source = msg.source_nick().unwrap_or("").to_string();

    match msg.command.as_str() {
        // RPL_WELCOME: the first param is the nick the server registered us with
        "001" => {
            let nick = msg.param(0).unwrap_or(current_nick).to_string();
            let _ = event_tx.send(UiEvent::Welcome { nick: nick.clone() });
            if nick != current_nick {
                Some(nick)
            } else {
                None
            }
        }

        // RPL_NAMREPLY: <me> <type> <channel> :<names>
        "353" => {
            if let (Some(channel), Some(names)) = (msg.param(2), msg.param(3)) {
                let names = names
                    .split_whitespace()
                    .map(|n| strip_mode_prefix(n).to_string())
                    .collect();
                let _ = event_tx.send(UiEvent::Names {
                    channel: channel.to_string(),
                    names,
                });
            }
            None
        }

        // ERR_ERRONEUSNICKNAME: <me> <nick> :reason
        "432" => {
            let nick = msg.param(1).unwrap_or_default().to_string();
            let _ = event_tx.send(UiEvent::ErroneousNickname(nick));
            None
        }

        // ERR_NICKNAMEINUSE: <me> <nick> :reason
        "433" => {
            let nick = msg.param(1).unwrap_or_default().to_string();
            let _ = event_tx.send(UiEvent::NicknameInUse(nick));
            None
        }

        "JOIN" => {
            if let Some(channel) = msg.param(0) {
                let _ = event_tx.send(UiEvent::Joined {
                    channel: channel.to_string(),
                    nick: source,
                });
            }
            None
        }

        "PART" => {
            if let Some(channel) = msg.param(0) {
                let _ = event_tx.send(UiEvent::Parted {
                    channel: channel.to_string(),
                    nick: source,
                });
            }
            None
        }

        "QUIT" => {
            let _ = event_tx.send(UiEvent::Quit {
                nick: source,
                reason: msg.param(0).map(str::to_string),
            });
            None
        }

        "NICK" => {
            let new_nick = msg.param(0)?.to_string();
            let _ = event_tx.send(UiEvent::NickChanged {
                old: source.clone(),
                new: new_nick.clone(),
            });
            if source == current_nick {
                Some(new_nick)
            } else {
                None
            }
        }

        "PRIVMSG" => {
            if let (Some(target), Some(text)) = (msg.param(0), msg.param(1)) {
                let _ = event_tx.send(UiEvent::Message {
                    target: target.to_string(),
                    sender: source,
                    text: text.to_string(),
                });
            }
            None
        }

        "NOTICE" => {
            let sender = msg
                .source_nick()
                .map(str::to_string)
                .unwrap_or_else(|| "server".to_string());
            let text = msg.params.last().cloned().unwrap_or_default();
            let _ = event_tx.send(UiEvent::Notice { sender, text });
            None
        }

        "ERROR" => {
            let text = msg.param(0).unwrap_or("Unknown error").to_string();
            let _ = event_tx.send(UiEvent::ServerError(text));
            None
        }

        _ => None,
    }
}

/// Handle a message received from the IRC server
pub async fn handle_server_message(
    message: IrcMessage,
    session: &mut Session,
    event_tx: &Sender<UiEvent>,
) {
    if session.debug {
        let _ = event_tx.send(UiEvent::Raw(message.to_line()));
    }

    if message.command == "PING" {
        let token = message.param(0).unwrap_or_default();
        if let Some(ref mut t) = session.transport {
            if let Err(e) = t.write_message(&IrcMessage::pong(token)).await {
                warn!(error = %e, "Failed to answer PING");
            }
        }
        return;
    }

    if let Some(new_nick) = route_message(&message, &session.current_nick, event_tx) {
        debug!(old = %session.current_nick, new = %new_nick, "Own nick changed");
        session.current_nick = new_nick;
    }
}

/// Send one message, reporting failure to the front end.
async fn send_or_report(
    transport: &mut Option<Transport>,
    msg: IrcMessage,
    what: &str,
    event_tx: &Sender<UiEvent>,
) {
    match transport {
        Some(t) => {
            if let Err(e) = t.write_message(&msg).await {
                let _ = event_tx.send(UiEvent::Error(format!("Failed to {}: {}", what, e)));
            }
        }
        None => {
            let _ = event_tx.send(UiEvent::Error("Not connected".into()));
        }
    }
}

/// Handle a backend action from the front end
pub async fn handle_backend_action(
    action: BackendAction,
    session: &mut Session,
    event_tx: &Sender<UiEvent>,
) {
    match action {
        BackendAction::Connect {
            server,
            port,
            nickname,
            use_tls,
            tls_verify,
        } => {
            session.transport = None;
            session.current_nick = nickname.clone();

            let protocol = if use_tls { "TLS" } else { "TCP" };
            info!(%server, port, protocol, "Connecting");

            match connection::establish_connection(&server, port, use_tls, tls_verify).await {
                Ok(mut transport) => {
                    let registration = [
                        IrcMessage::nick(&nickname),
                        IrcMessage::user(&nickname, REALNAME),
                    ];
                    for msg in &registration {
                        if let Err(e) = transport.write_message(msg).await {
                            let _ = event_tx.send(UiEvent::Error(format!(
                                "Failed to register: {}",
                                e
                            )));
                            return;
                        }
                    }
                    session.transport = Some(transport);
                }
                Err(e) => {
                    warn!(error = %e, "Connection failed");
                    let _ = event_tx.send(UiEvent::Error(e.to_string()));
                }
            }
        }

        BackendAction::Join(channel) => {
            send_or_report(&mut session.transport, IrcMessage::join(&channel), "join", event_tx)
                .await;
            send_or_report(
                &mut session.transport,
                IrcMessage::names(&channel),
                "request names",
                event_tx,
            )
            .await;
        }

        BackendAction::Identify { account, password } => {
            info!(%account, "Identifying with NickServ");
            let text = format!("IDENTIFY {} {}", account, password);
            send_or_report(
                &mut session.transport,
                IrcMessage::privmsg("NickServ", &text),
                "identify",
                event_tx,
            )
            .await;
        }

        BackendAction::Nick(new_nick) => {
            send_or_report(&mut session.transport, IrcMessage::nick(&new_nick), "change nick", event_tx)
                .await;
        }

        BackendAction::SendMessage { target, text } => {
            send_or_report(
                &mut session.transport,
                IrcMessage::privmsg(&target, &text),
                "send",
                event_tx,
            )
            .await;
        }

        BackendAction::Quit(reason) => {
            if let Some(ref mut t) = session.transport {
                let _ = t.write_message(&IrcMessage::quit(&reason)).await;
            }
            session.transport = None;
            let _ = event_tx.send(UiEvent::Disconnected("User quit".into()));
        }
    }
}
