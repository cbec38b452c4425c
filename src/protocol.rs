/// Actions sent from the front end to the Backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendAction {
    /// Connect to an IRC server and register
    Connect {
        server: String,
        port: u16,
        nickname: String,
        use_tls: bool,
        tls_verify: bool,
    },
    /// Join a channel and request its member list
    Join(String),
    /// Identify with NickServ
    Identify { account: String, password: String },
    /// Change nick
    Nick(String),
    /// Send a message to a target (channel or user)
    SendMessage { target: String, text: String },
    /// Quit the server with a reason
    Quit(String),
}

/// Events sent from the Backend to the front end
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// RPL_WELCOME: registration finished under the given nick
    Welcome { nick: String },
    /// Disconnected from server
    Disconnected(String),
    /// Connection or transport error
    Error(String),
    /// ERROR line from the server
    ServerError(String),
    /// Someone (possibly us) joined a channel
    Joined { channel: String, nick: String },
    /// Names list for a channel, mode prefixes already stripped
    Names { channel: String, names: Vec<String> },
    /// Someone (possibly us) left a channel
    Parted { channel: String, nick: String },
    /// Someone left the server
    Quit { nick: String, reason: Option<String> },
    /// Nick change observed on the server
    NickChanged { old: String, new: String },
    /// PRIVMSG received; CTCP ACTION payloads are kept intact
    Message {
        target: String,
        sender: String,
        text: String,
    },
    /// NOTICE received
    Notice { sender: String, text: String },
    /// 432 ERR_ERRONEUSNICKNAME
    ErroneousNickname(String),
    /// 433 ERR_NICKNAMEINUSE
    NicknameInUse(String),
    /// Raw server line (only emitted in debug mode)
    Raw(String),
}
