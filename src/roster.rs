//! Channel membership tracking.
//!
//! Keeps, for each channel, the nicknames currently present in the order they
//! were first seen. Updated from join/part/quit/nick events and NAMES replies.
//! Channel names are case-insensitive.

use std::collections::HashMap;

/// Channel membership prefixes a server may put in front of a nick in NAMES.
const MODE_PREFIXES: [char; 5] = ['~', '&', '@', '%', '+'];

/// Strip a single channel-mode prefix (`~ & @ % +`) from a NAMES entry.
pub fn strip_mode_prefix(name: &str) -> &str {
    match name.chars().next() {
        Some(c) if MODE_PREFIXES.contains(&c) => &name[c.len_utf8()..],
        _ => name,
    }
}

/// Case-folded form of a channel name, used as the roster key.
pub fn channel_key(channel: &str) -> String {
    channel.to_lowercase()
}

/// Whether two channel names refer to the same channel.
pub fn same_channel(a: &str, b: &str) -> bool {
    channel_key(a) == channel_key(b)
}

#[derive(Debug, Default, Clone)]
pub struct Roster {
    channels: HashMap<String, Vec<String>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a (possibly empty) member list exists for `channel`.
    pub fn ensure_channel(&mut self, channel: &str) {
        self.channels.entry(channel_key(channel)).or_default();
    }

    /// Add `nick` to `channel`. Returns false if it was already there.
    pub fn add(&mut self, channel: &str, nick: &str) -> bool {
        let users = self.channels.entry(channel_key(channel)).or_default();
        if users.iter().any(|u| u == nick) {
            return false;
        }
        users.push(nick.to_string());
        true
    }

    /// Add every name of a NAMES reply, returning the ones that were new.
    pub fn add_names<'a, I>(&mut self, channel: &str, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|n| !n.is_empty())
            .filter(|n| self.add(channel, n))
            .map(str::to_string)
            .collect()
    }

    /// Remove `nick` from `channel`. Returns false if it was not there.
    pub fn remove(&mut self, channel: &str, nick: &str) -> bool {
        match self.channels.get_mut(&channel_key(channel)) {
            Some(users) => {
                let before = users.len();
                users.retain(|u| u != nick);
                users.len() != before
            }
            None => false,
        }
    }

    /// Remove `nick` from every channel (QUIT). Returns the channels it left.
    pub fn remove_everywhere(&mut self, nick: &str) -> Vec<String> {
        let mut left: Vec<String> = self
            .channels
            .iter_mut()
            .filter_map(|(channel, users)| {
                let before = users.len();
                users.retain(|u| u != nick);
                (users.len() != before).then(|| channel.clone())
            })
            .collect();
        left.sort();
        left
    }

    /// Apply a nick change in one channel. Returns true if membership changed.
    pub fn rename(&mut self, channel: &str, old: &str, new: &str) -> bool {
        let removed = self.remove(channel, old);
        let added = self.add(channel, new);
        removed || added
    }

    pub fn contains(&self, channel: &str, nick: &str) -> bool {
        self.channels
            .get(&channel_key(channel))
            .is_some_and(|users| users.iter().any(|u| u == nick))
    }

    /// Members in the order they were first seen.
    pub fn users(&self, channel: &str) -> &[String] {
        self.channels
            .get(&channel_key(channel))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Members sorted case-insensitively, as a user list shows them.
    pub fn sorted(&self, channel: &str) -> Vec<String> {
        let mut users = self.users(channel).to_vec();
        users.sort_by_key(|u| u.to_lowercase());
        users
    }

    pub fn count(&self, channel: &str) -> usize {
        self.users(channel).len()
    }
}
