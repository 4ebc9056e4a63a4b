//! mIRC color palette.

use std::fmt;

/// A run's foreground or background color.
///
/// `Default` means the presentation layer's normal color.
/// `ReversedDefault` marks a default color that reverse video swapped to
/// the other side, so the renderer can pick its inverted counterpart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IrcColor {
    #[default]
    Default,
    ReversedDefault,
    White,
    Black,
    Blue,
    Green,
    Red,
    Brown,
    Purple,
    Orange,
    Yellow,
    LightGreen,
    Teal,
    Cyan,
    LightBlue,
    Pink,
    Gray,
    LightGray,
}

const PALETTE: [IrcColor; 16] = [
    IrcColor::White,
    IrcColor::Black,
    IrcColor::Blue,
    IrcColor::Green,
    IrcColor::Red,
    IrcColor::Brown,
    IrcColor::Purple,
    IrcColor::Orange,
    IrcColor::Yellow,
    IrcColor::LightGreen,
    IrcColor::Teal,
    IrcColor::Cyan,
    IrcColor::LightBlue,
    IrcColor::Pink,
    IrcColor::Gray,
    IrcColor::LightGray,
];

impl IrcColor {
    /// Color for an mIRC code `0..=15`.
    pub fn from_code(code: u8) -> Option<Self> {
        PALETTE.get(usize::from(code)).copied()
    }

    /// The mIRC code, for palette colors.
    pub fn code(self) -> Option<u8> {
        PALETTE.iter().position(|c| *c == self).map(|i| i as u8)
    }

    /// Internal color slot: 0 is unset, otherwise the code plus one.
    pub(crate) fn from_slot(slot: u8) -> Self {
        match slot.checked_sub(1) {
            Some(code) => Self::from_code(code).unwrap_or_default(),
            None => Self::Default,
        }
    }

    pub(crate) fn slot(code: u8) -> Option<u8> {
        (usize::from(code) < PALETTE.len()).then(|| code + 1)
    }
}

impl fmt::Display for IrcColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{:02}", code),
            None => fmt::Debug::fmt(self, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(IrcColor::from_code(0), Some(IrcColor::White));
        assert_eq!(IrcColor::from_code(4), Some(IrcColor::Red));
        assert_eq!(IrcColor::from_code(15), Some(IrcColor::LightGray));
        assert_eq!(IrcColor::from_code(16), None);
        assert_eq!(IrcColor::Red.code(), Some(4));
        assert_eq!(IrcColor::Default.code(), None);
    }

    #[test]
    fn test_slots() {
        assert_eq!(IrcColor::slot(4), Some(5));
        assert_eq!(IrcColor::slot(99), None);
        assert_eq!(IrcColor::from_slot(0), IrcColor::Default);
        assert_eq!(IrcColor::from_slot(5), IrcColor::Red);
    }

    #[test]
    fn test_display() {
        assert_eq!(IrcColor::Blue.to_string(), "02");
        assert_eq!(IrcColor::ReversedDefault.to_string(), "ReversedDefault");
    }
}
