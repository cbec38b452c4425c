//! IRC line parsing, formatting and framing.
//!
//! Wire format: `[:prefix] COMMAND [params...] [:trailing]\r\n`

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// Longest line we accept from a server. RFC 2812 says 512 but IRCv3 tags
/// and some networks go well beyond that.
pub const MAX_LINE_LENGTH: usize = 8192;

/// One IRC protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty message")]
    Empty,
    #[error("missing command")]
    MissingCommand,
}

impl IrcMessage {
    pub fn new(command: &str, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.to_string(),
            params,
        }
    }

    /// Parse a single IRC line (with or without the trailing `\r\n`).
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut remaining = line;

        // IRCv3 message tags are not used by this client
        if remaining.starts_with('@') {
            match remaining.find(' ') {
                Some(idx) => remaining = remaining[idx..].trim_start(),
                None => return Err(ParseError::MissingCommand),
            }
        }

        let mut prefix = None;
        if let Some(rest) = remaining.strip_prefix(':') {
            match rest.find(' ') {
                Some(idx) => {
                    prefix = Some(rest[..idx].to_string());
                    remaining = rest[idx..].trim_start();
                }
                None => return Err(ParseError::MissingCommand),
            }
        }

        let command = match remaining.find(' ') {
            Some(idx) => {
                let cmd = remaining[..idx].to_uppercase();
                remaining = remaining[idx..].trim_start();
                cmd
            }
            None => {
                let cmd = remaining.to_uppercase();
                remaining = "";
                cmd
            }
        };
        if command.is_empty() {
            return Err(ParseError::MissingCommand);
        }

        let mut params = Vec::new();
        while !remaining.is_empty() {
            if let Some(trailing) = remaining.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match remaining.find(' ') {
                Some(idx) => {
                    params.push(remaining[..idx].to_string());
                    remaining = remaining[idx..].trim_start();
                }
                None => {
                    params.push(remaining.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            prefix,
            command,
            params,
        })
    }

    /// Format back to wire format, without the trailing `\r\n`.
    pub fn to_line(&self) -> String {
        let mut out = String::with_capacity(512);
        if let Some(ref prefix) = self.prefix {
            out.push(':');
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(&self.command);

        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            out.push(' ');
            if i == last && (param.is_empty() || param.contains(' ') || param.starts_with(':')) {
                out.push(':');
            }
            // CR/LF in user content would start a new command
            out.push_str(&param.replace(['\r', '\n'], " "));
        }
        out
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split('!').next().unwrap_or(prefix);
        let nick = nick.split('@').next().unwrap_or(nick);
        if nick.is_empty() {
            None
        } else {
            Some(nick)
        }
    }

    /// Parameter at `idx`, if present.
    pub fn param(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// Three-digit numeric reply code, if this is one.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 {
            self.command.parse().ok()
        } else {
            None
        }
    }

    pub fn nick(nickname: &str) -> Self {
        Self::new("NICK", vec![nickname.to_string()])
    }

    pub fn user(username: &str, realname: &str) -> Self {
        Self::new(
            "USER",
            vec![
                username.to_string(),
                "0".to_string(),
                "*".to_string(),
                realname.to_string(),
            ],
        )
    }

    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![channel.to_string()])
    }

    pub fn names(channel: &str) -> Self {
        Self::new("NAMES", vec![channel.to_string()])
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.to_string(), text.to_string()])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", vec![token.to_string()])
    }

    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", vec![reason.to_string()])
    }
}

impl std::fmt::Display for IrcMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Line codec for IRC: decodes lines (LF or CRLF), encodes messages with CRLF.
#[derive(Debug)]
pub struct IrcCodec {
    lines: LinesCodec,
}

impl IrcCodec {
    pub fn new() -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        }
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = String;
    type Error = LinesCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        self.lines.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        self.lines.decode_eof(src)
    }
}

impl Encoder<IrcMessage> for IrcCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, msg: IrcMessage, dst: &mut BytesMut) -> Result<(), LinesCodecError> {
        let line = msg.to_line();
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_prefix() {
        let msg = IrcMessage::parse(":alice!alice@host PRIVMSG #general :Hello world").unwrap();
        assert_eq!(msg.prefix, Some("alice!alice@host".into()));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#general", "Hello world"]);
        assert_eq!(msg.source_nick(), Some("alice"));
    }

    #[test]
    fn test_parse_numeric() {
        let msg = IrcMessage::parse(":irc.example.net 353 me = #chan :@op +voice plain\r\n").unwrap();
        assert_eq!(msg.numeric(), Some(353));
        assert_eq!(msg.param(2), Some("#chan"));
        assert_eq!(msg.param(3), Some("@op +voice plain"));
        assert_eq!(msg.source_nick(), Some("irc.example.net"));
    }

    #[test]
    fn test_parse_skips_tags() {
        let msg = IrcMessage::parse("@time=2024-01-01T00:00:00Z :bob!b@h JOIN #rust").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.source_nick(), Some("bob"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(IrcMessage::parse(""), Err(ParseError::Empty));
        assert_eq!(IrcMessage::parse("\r\n"), Err(ParseError::Empty));
        assert_eq!(IrcMessage::parse(":prefixonly"), Err(ParseError::MissingCommand));
    }

    #[test]
    fn test_parse_lowercase_command() {
        let msg = IrcMessage::parse("ping :token").unwrap();
        assert_eq!(msg.command, "PING");
        assert!(msg.numeric().is_none());
    }

    #[test]
    fn test_to_line_trailing() {
        assert_eq!(IrcMessage::privmsg("#c", "hi there").to_line(), "PRIVMSG #c :hi there");
        assert_eq!(IrcMessage::nick("alice").to_line(), "NICK alice");
        assert_eq!(IrcMessage::user("alice", "alice").to_line(), "USER alice 0 * alice");
        assert_eq!(IrcMessage::privmsg("#c", "").to_line(), "PRIVMSG #c :");
        assert_eq!(IrcMessage::privmsg("#c", ":)").to_line(), "PRIVMSG #c ::)");
    }

    #[test]
    fn test_to_line_strips_newlines() {
        let msg = IrcMessage::privmsg("#c", "one\r\nQUIT :bye");
        assert_eq!(msg.to_line(), "PRIVMSG #c :one  QUIT :bye");
    }

    #[test]
    fn test_codec_encodes_crlf() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(IrcMessage::join("#rust"), &mut buf).unwrap();
        assert_eq!(&buf[..], b"JOIN #rust\r\n");
    }

    #[test]
    fn test_codec_decodes_crlf_lines() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(&b"PING :a\r\nPING :b\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :a".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :b".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }
}
