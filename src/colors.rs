//! Per-nickname display colours.
//!
//! Nicks get colours round-robin from a fixed palette in the order they are
//! first seen, and keep them for the rest of the session.

use std::collections::HashMap;

use tracing::debug;

pub const PALETTE: [&str; 19] = [
    "#27252E", // dark grey
    "#E6194B", // red
    "#3CB44B", // green
    "#D1A75A", // yellow
    "#4363D8", // blue
    "#F58231", // orange
    "#911EB4", // violet
    "#42D4F4", // cyan
    "#F032E6", // magenta
    "#7BDC9A", // light green
    "#efb6b6", // pink
    "#469990", // teal
    "#d3afeb", // lavender
    "#9A6324", // brown
    "#800000", // maroon
    "#AAFFC3", // mint
    "#808000", // olive
    "#000075", // navy
    "#A5A5A5", // grey
];

#[derive(Debug, Default, Clone)]
pub struct NickColors {
    assigned: HashMap<String, &'static str>,
    next_index: usize,
}

impl NickColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `nick` the next palette colour unless it already has one.
    pub fn assign(&mut self, nick: &str) -> &'static str {
        if let Some(color) = self.get(nick) {
            return color;
        }
        let color = PALETTE[self.next_index];
        debug!(%nick, %color, "Assigning color");
        self.assigned.insert(nick.to_string(), color);
        self.next_index = (self.next_index + 1) % PALETTE.len();
        color
    }

    pub fn get(&self, nick: &str) -> Option<&'static str> {
        self.assigned.get(nick).copied()
    }

    /// Colour for `nick`, assigning one on first sight.
    pub fn color_of(&mut self, nick: &str) -> &'static str {
        self.assign(nick)
    }

    /// Pango-style markup for a user list entry.
    pub fn markup(&mut self, nick: &str) -> String {
        let color = self.color_of(nick);
        format!(
            "<span foreground='{}'>{}</span>",
            color,
            crate::format::escape_html(nick)
        )
    }
}
