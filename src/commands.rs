//! Parsing of submitted input lines (/me, /nick, /quit, ...).

use crate::validation;

pub const DEFAULT_QUIT_MESSAGE: &str = "Jargonaut signing out!";

pub const HELP_TEXT: &str =
    "Commands: /me <action>, /nick <newnick>, /quit [reason], /help. Start a line with // to send a literal /.";

/// What a submitted line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Plain text for the channel
    Say(String),
    /// `/me`: `local` is echoed in the transcript, `payload` is sent as a
    /// CTCP ACTION
    Action { local: String, payload: String },
    Nick(String),
    Quit(String),
    Help,
    /// Bad usage or unknown command; the text explains
    Invalid(String),
}

/// Interpret a trimmed, non-empty input line.
pub fn parse_input(line: &str, own_nick: &str) -> UserCommand {
    if let Some(literal) = line.strip_prefix("//") {
        return UserCommand::Say(format!("/{}", literal));
    }
    let Some(cmdline) = line.strip_prefix('/') else {
        return UserCommand::Say(line.to_string());
    };

    let (cmd, args) = match cmdline.split_once(' ') {
        Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
        None => (cmdline.to_lowercase(), ""),
    };

    match cmd.as_str() {
        "me" => {
            if args.is_empty() {
                UserCommand::Invalid("Usage: /me <action>".into())
            } else {
                UserCommand::Action {
                    local: format!("{} {}", own_nick, args),
                    payload: args.to_string(),
                }
            }
        }
        "nick" => match args.split_whitespace().next() {
            Some(new_nick) => match validation::validate_nickname(new_nick) {
                Ok(()) => UserCommand::Nick(new_nick.to_string()),
                Err(e) => UserCommand::Invalid(e),
            },
            None => UserCommand::Invalid("Usage: /nick <newnick>".into()),
        },
        "quit" | "exit" => {
            if args.is_empty() {
                UserCommand::Quit(DEFAULT_QUIT_MESSAGE.to_string())
            } else {
                UserCommand::Quit(args.to_string())
            }
        }
        "help" => UserCommand::Help,
        unknown => UserCommand::Invalid(format!("Unknown command: /{}", unknown)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_input("hello", "me"), UserCommand::Say("hello".into()));
        assert_eq!(parse_input("//tmp is full", "me"), UserCommand::Say("/tmp is full".into()));
    }

    #[test]
    fn test_me() {
        assert_eq!(
            parse_input("/me waves", "alice"),
            UserCommand::Action {
                local: "alice waves".into(),
                payload: "waves".into(),
            }
        );
        assert!(matches!(parse_input("/me", "alice"), UserCommand::Invalid(_)));
    }

    #[test]
    fn test_nick() {
        assert_eq!(parse_input("/NICK bob", "alice"), UserCommand::Nick("bob".into()));
        assert!(matches!(parse_input("/nick", "alice"), UserCommand::Invalid(_)));
        assert!(matches!(parse_input("/nick 1bad", "alice"), UserCommand::Invalid(_)));
    }

    #[test]
    fn test_quit() {
        assert_eq!(
            parse_input("/quit", "a"),
            UserCommand::Quit(DEFAULT_QUIT_MESSAGE.into())
        );
        assert_eq!(parse_input("/exit see you", "a"), UserCommand::Quit("see you".into()));
    }

    #[test]
    fn test_help_and_unknown() {
        assert_eq!(parse_input("/help", "a"), UserCommand::Help);
        assert_eq!(
            parse_input("/kick bob", "a"),
            UserCommand::Invalid("Unknown command: /kick".into())
        );
    }
}
