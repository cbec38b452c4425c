//! IRC formatting code conversion and text styling.
//!
//! Incoming text is escaped first, so nothing a user types is interpreted as
//! markup, and then paired control codes become HTML tags and URLs become
//! links.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const BOLD: char = '\x02';
pub const ITALIC: char = '\x1D';
/// Reverse-video code. Some input widgets cannot insert `\x1D`, so italics
/// are typed as `\x16` and converted before sending.
pub const ITALIC_ALT: char = '\x16';
pub const UNDERLINE: char = '\x1F';
pub const STRIKETHROUGH: char = '\x1E';
pub const RESET: char = '\x0F';
pub const COLOR: char = '\x03';

const ACTION_PREFIX: &str = "\x01ACTION";
const IMAGE_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".bmp", ".webp"];

static STYLE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\x02(.*?)\x02", "<b>$1</b>"),
        (r"\x16(.*?)\x16", "<i>$1</i>"),
        (r"\x1D(.*?)\x1D", "<i>$1</i>"),
        (r"\x1F(.*?)\x1F", "<u>$1</u>"),
        (r"\x1E(.*?)\x1E", "<s>$1</s>"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("style regex pattern is valid"),
            replacement,
        )
    })
    .collect()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://[^\s<\x00-\x1F]{3,}\.[^\s<\x00-\x1F]{2,}")
        .expect("URL regex pattern is valid")
});

static COLOR_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x03(\d{1,2}(,\d{1,2})?)?").expect("color regex pattern is valid"));

/// Escape text so it is shown exactly as typed.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether a URL points at an image, ignoring any query string.
pub fn is_image_url(url: &str) -> bool {
    let last = url.rsplit('/').next().unwrap_or(url);
    let file = last.split('?').next().unwrap_or(last).to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| file.ends_with(ext))
}

/// Turn raw message text into the HTML fragment shown in the transcript.
pub fn format_message(text: &str, show_thumbs: bool) -> String {
    let mut html = escape_html(text);
    for (re, replacement) in STYLE_RULES.iter() {
        html = re.replace_all(&html, *replacement).into_owned();
    }
    URL_RE
        .replace_all(&html, |caps: &Captures| {
            let url = &caps[0];
            if show_thumbs && is_image_url(url) {
                format!(
                    r#"<a href="{url}"><img class="thumb" src="{url}" title="{url}"/></a>"#
                )
            } else {
                format!(r#"<a href="{url}">{url}</a>"#)
            }
        })
        .into_owned()
}

/// Whether `text` addresses `nick` as a whole word: `nick`, `nick:` or `@nick`.
pub fn is_mention(text: &str, nick: &str) -> bool {
    if nick.is_empty() {
        return false;
    }
    let nick = nick.to_lowercase();
    let with_colon = format!("{}:", nick);
    let with_at = format!("@{}", nick);
    text.to_lowercase()
        .split(' ')
        .any(|word| word == nick || word == with_colon || word == with_at)
}

/// Payload of a CTCP ACTION (`/me`) message, if `text` is one.
pub fn action_payload(text: &str) -> Option<&str> {
    text.strip_prefix(ACTION_PREFIX)?
        .strip_suffix('\x01')
        .map(|s| s.strip_prefix(' ').unwrap_or(s))
}

/// Italic line for an already formatted action payload.
pub fn action_html(payload_html: &str) -> String {
    format!("<i>&lt;-- {}</i>", payload_html)
}

/// Bytes `encode_action` adds around a payload.
pub const ACTION_OVERHEAD: usize = ACTION_PREFIX.len() + 2;

/// Wrap an action payload for sending.
pub fn encode_action(payload: &str) -> String {
    format!("{} {}\x01", ACTION_PREFIX, payload)
}

/// Remove formatting codes for plain-text output.
pub fn strip_codes(text: &str) -> String {
    let text = match action_payload(text) {
        Some(payload) => payload.to_string(),
        None => text.to_string(),
    };
    COLOR_CODE_RE
        .replace_all(&text, "")
        .chars()
        .filter(|c| {
            !matches!(
                *c,
                BOLD | ITALIC | ITALIC_ALT | UNDERLINE | STRIKETHROUGH | RESET | '\x01'
            )
        })
        .collect()
}
