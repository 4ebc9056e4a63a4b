//! Channel name utilities.
//!
//! The dispatcher and the session both need to decide whether a token
//! names a channel. Networks advertise their channel prefixes through
//! `CHANTYPES`; [`DEFAULT_CHANNEL_TYPES`] covers the RFC 2812 set.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

/// Channel prefixes assumed when a network does not say otherwise.
pub const DEFAULT_CHANNEL_TYPES: &str = "#&+!";

/// Maximum channel name length in characters, prefix included.
pub const MAX_CHANNEL_NAME_LEN: usize = 50;

/// Check whether `name` is a channel name under the given prefix set.
///
/// Valid channel names start with one of `types`, are at most
/// [`MAX_CHANNEL_NAME_LEN`] characters long, and contain no space,
/// comma or control character.
pub fn is_channel_name(name: &str, types: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if types.contains(first) => {}
        _ => return false,
    }

    if name.chars().count() > MAX_CHANNEL_NAME_LEN {
        return false;
    }

    chars.all(|c| c != ' ' && c != ',' && !c.is_control())
}

/// Extension trait for checking if a string is a valid IRC channel name.
pub trait ChannelExt {
    /// Check against [`DEFAULT_CHANNEL_TYPES`].
    fn is_channel_name(&self) -> bool;

    /// Check against a network-specific prefix set.
    fn is_channel_name_with(&self, types: &str) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        is_channel_name(self, DEFAULT_CHANNEL_TYPES)
    }

    fn is_channel_name_with(&self, types: &str) -> bool {
        is_channel_name(self, types)
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }

    fn is_channel_name_with(&self, types: &str) -> bool {
        self.as_str().is_channel_name_with(types)
    }
}
