//! Settings store.
//!
//! A flat key-value store persisted as JSON in the platform config directory.
//! The NickServ password is kept out of the file, in the OS keyring.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::validation;

// Default configuration
pub const DEFAULT_SERVER: &str = "irc.libera.chat";
pub const DEFAULT_PORT: u16 = 6697;
pub const DEFAULT_CHANNEL: &str = "#jargonaut";

const KEYRING_SERVICE: &str = "jargonaut";

/// Every key the store knows, in display order.
pub const KEYS: [&str; 11] = [
    "server",
    "port",
    "channel",
    "nickname",
    "tls-connection",
    "tls-verify",
    "timestamp-24h",
    "show-thumbs",
    "user-list-visible",
    "debug",
    "log-chat",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a configuration directory")]
    NoConfigDir,
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keyring access failed: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub server: String,
    pub port: u16,
    pub channel: String,
    /// Empty means "use the login name"
    pub nickname: String,
    pub tls_connection: bool,
    /// Check the server certificate against trusted roots
    pub tls_verify: bool,
    pub timestamp_24h: bool,
    pub show_thumbs: bool,
    pub user_list_visible: bool,
    /// Log raw server lines
    pub debug: bool,
    /// Append the channel transcript to daily log files
    pub log_chat: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            channel: DEFAULT_CHANNEL.to_string(),
            nickname: String::new(),
            tls_connection: true,
            tls_verify: false,
            timestamp_24h: false,
            show_thumbs: true,
            user_list_visible: true,
            debug: false,
            log_chat: false,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn invalid(key: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

impl Settings {
    /// Current value of `key`, as text.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "server" => self.server.clone(),
            "port" => self.port.to_string(),
            "channel" => self.channel.clone(),
            "nickname" => self.nickname.clone(),
            "tls-connection" => self.tls_connection.to_string(),
            "tls-verify" => self.tls_verify.to_string(),
            "timestamp-24h" => self.timestamp_24h.to_string(),
            "show-thumbs" => self.show_thumbs.to_string(),
            "user-list-visible" => self.user_list_visible.to_string(),
            "debug" => self.debug.to_string(),
            "log-chat" => self.log_chat.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Parse and store `value` under `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "server" => {
                let server = value.trim();
                if server.is_empty() || server.contains(char::is_whitespace) {
                    return Err(invalid(key, value, "expected a host name".into()));
                }
                self.server = server.to_string();
            }
            "port" => {
                let port: u16 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(key, value, "expected a port number".into()))?;
                if port == 0 {
                    return Err(invalid(key, value, "port must be greater than 0".into()));
                }
                self.port = port;
            }
            "channel" => {
                validation::validate_channel_name(value).map_err(|e| invalid(key, value, e))?;
                self.channel = value.to_string();
            }
            "nickname" => {
                let nick = value.trim();
                if !nick.is_empty() {
                    validation::validate_nickname(nick).map_err(|e| invalid(key, value, e))?;
                }
                self.nickname = nick.to_string();
            }
            "tls-connection" => self.tls_connection = parse_bool(key, value)?,
            "tls-verify" => self.tls_verify = parse_bool(key, value)?,
            "timestamp-24h" => self.timestamp_24h = parse_bool(key, value)?,
            "show-thumbs" => self.show_thumbs = parse_bool(key, value)?,
            "user-list-visible" => self.user_list_visible = parse_bool(key, value)?,
            "debug" => self.debug = parse_bool(key, value)?,
            "log-chat" => self.log_chat = parse_bool(key, value)?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Location of the default settings file.
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    let proj = ProjectDirs::from("org", "x", "jargonaut").ok_or(ConfigError::NoConfigDir)?;
    Ok(proj.config_dir().join("settings.json"))
}

/// A settings file on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Load, change one key, save.
    pub fn update(&self, key: &str, value: &str) -> Result<Settings, ConfigError> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }
}

/// NickServ password for `account`, if one is stored.
pub fn load_password(account: &str) -> Result<Option<String>, ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_password(account: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)?;
    entry.set_password(password)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.get("server").unwrap(), DEFAULT_SERVER);
        assert_eq!(s.get("port").unwrap(), "6697");
        assert_eq!(s.get("tls-connection").unwrap(), "true");
        assert_eq!(s.get("nickname").unwrap(), "");
    }

    #[test]
    fn test_every_key_is_readable() {
        let s = Settings::default();
        for key in KEYS {
            assert!(s.get(key).is_ok(), "key {} should be readable", key);
        }
    }

    #[test]
    fn test_set_typed_values() {
        let mut s = Settings::default();
        s.set("port", "6667").unwrap();
        s.set("tls-connection", "off").unwrap();
        s.set("timestamp-24h", "yes").unwrap();
        s.set("channel", "#rust").unwrap();
        s.set("nickname", "alice").unwrap();
        assert_eq!(s.port, 6667);
        assert!(!s.tls_connection);
        assert!(s.timestamp_24h);
        assert_eq!(s.channel, "#rust");
        assert_eq!(s.nickname, "alice");

        // Clearing the nickname is allowed
        s.set("nickname", "").unwrap();
        assert_eq!(s.nickname, "");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut s = Settings::default();
        assert!(matches!(s.set("port", "0"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(s.set("port", "http"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(s.set("debug", "maybe"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(s.set("channel", "rust"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(s.set("nickname", "9lives"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(s.set("colour", "red"), Err(ConfigError::UnknownKey(_))));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));

        // Missing file gives defaults
        assert_eq!(store.load().unwrap(), Settings::default());

        let updated = store.update("server", "irc.example.net").unwrap();
        assert_eq!(updated.server, "irc.example.net");
        assert_eq!(store.load().unwrap().server, "irc.example.net");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r##"{ "channel": "#linuxmint-chat", "timestamp-24h": true }"##).unwrap();

        let s = SettingsStore::new(&path).load().unwrap();
        assert_eq!(s.channel, "#linuxmint-chat");
        assert!(s.timestamp_24h);
        assert_eq!(s.port, DEFAULT_PORT);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(SettingsStore::new(&path).load(), Err(ConfigError::Json(_))));
    }
}
