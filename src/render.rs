//! Transcript rendering: a full HTML document for viewers that display markup,
//! and plain lines for the terminal.

use chrono::{DateTime, Local};

use crate::buffer::{Message, MessageKind, Transcript};
use crate::colors::NickColors;
use crate::config::Settings;
use crate::format::{self, escape_html};

/// Consecutive messages from one nick closer than this are grouped.
const GROUP_WINDOW_MINUTES: i64 = 5;

const STYLE: &str = "\
body { font-family: sans-serif; font-size: 14px; margin: 0 12px; }
.messages { position: relative; padding: 6px 0 6px 44px; }
.avatar span { position: absolute; left: 0; width: 32px; height: 32px; border-radius: 50%; \
color: white; text-align: center; line-height: 32px; font-weight: bold; }
.nick { font-weight: bold; }
.date { font-weight: normal; opacity: 0.6; margin-left: 8px; font-size: 12px; }
.mine .nick { opacity: 0.8; }
.response { font-weight: bold; }
.action { padding: 2px 0 2px 44px; opacity: 0.6; font-style: italic; }
img.thumb { max-width: 320px; max-height: 240px; display: block; }
hr.solid { border-top: 1px solid #d33; }
";

/// Everything rendering needs besides the transcript itself.
#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub own_nick: &'a str,
    pub use_24h: bool,
    pub show_thumbs: bool,
    pub now: DateTime<Local>,
}

impl<'a> RenderOptions<'a> {
    /// Options for rendering now, as `settings` ask.
    pub fn from_settings(own_nick: &'a str, settings: &Settings) -> Self {
        Self {
            own_nick,
            use_24h: settings.timestamp_24h,
            show_thumbs: settings.show_thumbs,
            now: Local::now(),
        }
    }
}

/// `H:MM` or `I:MM AM/PM`, with the date appended for messages older than
/// today.
pub fn format_timestamp(time: &DateTime<Local>, use_24h: bool, now: &DateTime<Local>) -> String {
    let mut formatted = if use_24h {
        time.format("%-H:%M").to_string()
    } else {
        time.format("%-I:%M %p").to_string()
    };
    let midnight = now.date_naive().and_hms_opt(0, 0, 0);
    if midnight.is_some_and(|m| time.naive_local() < m) {
        formatted.push(' ');
        formatted.push_str(&time.format("%x").to_string());
    }
    formatted
}

fn action_sentence(msg: &Message) -> Option<String> {
    let nick = msg.nick.as_deref().unwrap_or("");
    match &msg.kind {
        MessageKind::Join => Some(format!("{} joined the channel", nick)),
        MessageKind::Quit => Some(format!("{} left the channel", nick)),
        MessageKind::NickChange { old } => Some(format!("{} is now {}", old, nick)),
        MessageKind::Chat | MessageKind::Separator => None,
    }
}

/// HTML fragment for one chat message body.
fn chat_html(text: &str, show_thumbs: bool) -> String {
    match format::action_payload(text) {
        Some(payload) => format::action_html(&format::format_message(payload, show_thumbs)),
        None => format::format_message(text, show_thumbs),
    }
}

/// Render the whole transcript as an HTML document.
pub fn render_html(transcript: &Transcript, colors: &mut NickColors, opts: &RenderOptions) -> String {
    let mut section = String::new();
    let mut group_open = false;
    let mut last_chat: Option<(&str, DateTime<Local>)> = None;

    let close_group = |section: &mut String, group_open: &mut bool| {
        if *group_open {
            section.push_str("</div>\n");
            *group_open = false;
        }
    };

    for msg in &transcript.messages {
        match msg.kind {
            MessageKind::Separator => {
                close_group(&mut section, &mut group_open);
                section.push_str("<hr class=\"solid\">\n");
                last_chat = None;
            }
            MessageKind::Chat => {
                let nick = msg.nick.as_deref().unwrap_or("");
                let text = msg.text.as_deref().unwrap_or("");
                let response = if nick != opts.own_nick && format::is_mention(text, opts.own_nick) {
                    " response"
                } else {
                    ""
                };
                let continues = last_chat.is_some_and(|(last_nick, last_time)| {
                    last_nick == nick
                        && (msg.time - last_time).num_minutes() < GROUP_WINDOW_MINUTES
                });

                if !continues {
                    close_group(&mut section, &mut group_open);
                    let mine = if nick == opts.own_nick { " mine" } else { "" };
                    let letter: String = nick
                        .chars()
                        .next()
                        .map(|c| c.to_uppercase().collect())
                        .unwrap_or_default();
                    let color = colors.color_of(nick);
                    let date = format_timestamp(&msg.time, opts.use_24h, &opts.now);
                    section.push_str(&format!(
                        "<div class=\"messages{mine}\">\n\
                         <span class=\"avatar\"><span style=\"background-color:{color}\">{letter}</span></span>\n\
                         <div class=\"nick\">{nick}<span class=\"date\">{date}</span></div>\n",
                        letter = escape_html(&letter),
                        nick = escape_html(nick),
                    ));
                    group_open = true;
                }
                section.push_str(&format!(
                    "<div class=\"line{}\">{}</div>\n",
                    response,
                    chat_html(text, opts.show_thumbs)
                ));
                last_chat = Some((nick, msg.time));
            }
            // Joins, leaves and nick changes do not break a run of messages
            _ => {
                if let Some(sentence) = action_sentence(msg) {
                    section.push_str(&format!(
                        "<div class=\"action\"><div class=\"action-text\">{}</div></div>\n",
                        escape_html(&sentence)
                    ));
                }
            }
        }
    }
    close_group(&mut section, &mut group_open);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <link rel=\"stylesheet\" type=\"text/css\" href=\"webview.css\">\n\
         <style>\n{STYLE}</style>\n</head>\n<body>\n{section}\
         <script>window.scrollTo(0, document.body.scrollHeight);</script>\n\
         </body>\n</html>\n"
    )
}

/// 24-bit ANSI foreground for a `#RRGGBB` colour.
fn ansi_colored(text: &str, hex: &str) -> String {
    let channel =
        |i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or("ff"), 16).unwrap_or(255);
    format!(
        "\x1b[38;2;{};{};{}m{}\x1b[0m",
        channel(1),
        channel(3),
        channel(5),
        text
    )
}

/// One terminal line for a transcript entry. Separators have no line.
pub fn render_line(
    msg: &Message,
    colors: &mut NickColors,
    opts: &RenderOptions,
    ansi: bool,
) -> Option<String> {
    let nick = msg.nick.as_deref().unwrap_or("");
    let ts = format_timestamp(&msg.time, opts.use_24h, &opts.now);
    let shown_nick = if ansi {
        let color = colors.color_of(nick);
        ansi_colored(nick, color)
    } else {
        nick.to_string()
    };

    match &msg.kind {
        MessageKind::Separator => None,
        MessageKind::Chat => {
            let raw = msg.text.as_deref().unwrap_or("");
            let text = format::strip_codes(raw);
            let mark = if nick != opts.own_nick && format::is_mention(raw, opts.own_nick) {
                "!"
            } else {
                ""
            };
            if format::action_payload(raw).is_some() {
                Some(format!("[{}]{} * {} {}", ts, mark, shown_nick, text))
            } else {
                Some(format!("[{}]{} <{}> {}", ts, mark, shown_nick, text))
            }
        }
        MessageKind::Join => Some(format!("[{}] --> {} joined the channel", ts, shown_nick)),
        MessageKind::Quit => Some(format!("[{}] <-- {} left the channel", ts, shown_nick)),
        MessageKind::NickChange { old } => {
            Some(format!("[{}] --- {} is now {}", ts, old, shown_nick))
        }
    }
}
