//! Input validation for settings and outgoing text

/// Longest message body we send in one PRIVMSG. The 512-byte line limit also
/// has to fit the prefix the server adds when relaying.
pub const MAX_MESSAGE_BYTES: usize = 400;

/// Validates an IRC channel name according to RFC 2812
pub fn validate_channel_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Channel name cannot be empty".to_string());
    }
    if !name.starts_with('#') && !name.starts_with('&') {
        return Err("Channel name must start with # or &".to_string());
    }
    if name.len() > 50 {
        return Err("Channel name too long (max 50 characters)".to_string());
    }
    if name.contains(|c: char| c.is_control() || c == ' ' || c == ',') {
        return Err("Channel name contains invalid characters".to_string());
    }
    Ok(())
}

/// Validate an IRC nickname according to RFC 2812, with the longer length
/// most networks allow.
pub fn validate_nickname(nick: &str) -> Result<(), String> {
    let first = nick
        .chars()
        .next()
        .ok_or_else(|| "Nickname cannot be empty".to_string())?;
    if nick.len() > 30 {
        return Err("Nickname too long (max 30 characters)".to_string());
    }
    if !first.is_ascii_alphabetic() && !"[]{}\\|_^`".contains(first) {
        return Err("Nickname must start with a letter or one of []{}\\|_^`".to_string());
    }
    if let Some(c) = nick
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !"-[]{}\\|_^`".contains(*c))
    {
        return Err(format!("Invalid character '{}' in nickname", c));
    }
    Ok(())
}

/// Strip characters that would break the IRC line.
pub fn sanitize_message(msg: &str) -> String {
    msg.chars()
        .filter(|&c| c != '\r' && c != '\n' && c != '\0')
        .collect()
}

/// Split a message into chunks that each fit in one PRIVMSG, breaking at
/// spaces where possible and never inside a UTF-8 character.
pub fn split_message(msg: &str) -> Vec<String> {
    split_message_within(msg, MAX_MESSAGE_BYTES)
}

/// Like [`split_message`], with chunks of at most `limit` bytes.
pub fn split_message_within(msg: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = msg;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if let Some(space) = rest[..cut].rfind(' ') {
            if space > 0 {
                cut = space;
            }
        }
        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start_matches(' ');
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_channel_name() {
        assert!(validate_channel_name("#test").is_ok());
        assert!(validate_channel_name("&local").is_ok());
        assert!(validate_channel_name("#linuxmint-chat").is_ok());

        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name("test").is_err());
        assert!(validate_channel_name("#test channel").is_err());
        assert!(validate_channel_name("#test,other").is_err());
        assert!(validate_channel_name(&"#".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_nickname() {
        assert!(validate_nickname("alice").is_ok());
        assert!(validate_nickname("Bob123").is_ok());
        assert!(validate_nickname("user_4f").is_ok());
        assert!(validate_nickname("[guest]").is_ok());

        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("123user").is_err());
        assert!(validate_nickname("user name").is_err());
        assert!(validate_nickname("b@d").is_err());
        assert!(validate_nickname(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_sanitize_message() {
        assert_eq!(sanitize_message("Hello, world!"), "Hello, world!");
        assert_eq!(sanitize_message("Line1\r\nLine2"), "Line1Line2");
    }

    #[test]
    fn test_split_message() {
        assert_eq!(split_message("short"), vec!["short"]);
        assert_eq!(split_message(""), vec![""]);

        let long = format!("{} {}", "a".repeat(300), "b".repeat(300));
        let chunks = split_message(&long);
        assert_eq!(chunks, vec!["a".repeat(300), "b".repeat(300)]);

        let unbroken = "é".repeat(300); // 600 bytes, no spaces
        let chunks = split_message(&unbroken);
        assert!(chunks.iter().all(|c| c.len() <= MAX_MESSAGE_BYTES));
        assert_eq!(chunks.concat(), unbroken);
    }

    #[test]
    fn test_split_message_within_limit() {
        assert_eq!(split_message_within("one two three", 8), vec!["one two", "three"]);
        assert_eq!(split_message_within("abcdef", 4), vec!["abcd", "ef"]);
    }
}
