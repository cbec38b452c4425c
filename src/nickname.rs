//! Nickname selection and collision fallback.

use rand::Rng;

/// Longest nickname we send, suffix included.
pub const MAX_NICK_LEN: usize = 16;
/// Room left for the prefix when a `_xx` suffix is appended.
const SUFFIXED_PREFIX_LEN: usize = MAX_NICK_LEN - 3;

/// Source of nicknames: the configured one, or the login name.
#[derive(Debug, Clone)]
pub struct NicknameSource {
    base: String,
}

impl NicknameSource {
    /// Use `configured` when set, otherwise the login user name.
    pub fn new(configured: &str) -> Self {
        let configured = configured.trim();
        let base = if configured.is_empty() {
            login_name()
        } else {
            configured.to_string()
        };
        Self { base }
    }

    /// The nickname to try first.
    pub fn initial(&self) -> String {
        truncate_chars(&self.base, MAX_NICK_LEN)
    }

    /// A fallback after a collision: `prefix_xx` with a random hex byte.
    pub fn with_random_suffix(&self) -> String {
        let suffix: u8 = rand::thread_rng().gen();
        with_suffix(&self.base, suffix)
    }
}

fn with_suffix(base: &str, suffix: u8) -> String {
    format!("{}_{:02x}", truncate_chars(base, SUFFIXED_PREFIX_LEN), suffix)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Login name from the environment, sanitised into a usable nick.
fn login_name() -> String {
    let raw = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-[]{}\\|_^".contains(*c))
        .collect();
    if cleaned.is_empty() {
        "guest".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_nick_is_truncated() {
        let source = NicknameSource::new("averyveryverylongnickname");
        assert_eq!(source.initial(), "averyveryverylon");
        assert_eq!(source.initial().chars().count(), MAX_NICK_LEN);
    }

    #[test]
    fn test_suffix_format() {
        assert_eq!(with_suffix("alice", 0x0f), "alice_0f");
        assert_eq!(with_suffix("averyveryverylongnickname", 0xab), "averyveryvery_ab");
    }

    #[test]
    fn test_random_suffix_shape() {
        let source = NicknameSource::new("alice");
        let nick = source.with_random_suffix();
        assert!(nick.starts_with("alice_"));
        assert_eq!(nick.len(), "alice_".len() + 2);
        assert!(nick[6..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_empty_configured_falls_back_to_login() {
        let source = NicknameSource::new("  ");
        let nick = source.initial();
        assert!(!nick.is_empty());
        assert!(nick.chars().count() <= MAX_NICK_LEN);
    }
}
