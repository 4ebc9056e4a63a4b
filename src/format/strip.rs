//! Removing formatting codes from text.

use std::borrow::Cow;

use super::scan::{is_format_code, Scanner, Segment};

/// Extension trait for handling formatted IRC strings.
pub trait FormattedStringExt<'a> {
    /// Check if the string contains any IRC formatting codes.
    fn is_formatted(&self) -> bool;

    /// Strip all IRC formatting codes, including color arguments.
    ///
    /// Returns `Cow::Borrowed` if no formatting was present.
    fn strip_formatting(self) -> Cow<'a, str>;
}

impl<'a> FormattedStringExt<'a> for &'a str {
    fn is_formatted(&self) -> bool {
        self.contains(is_format_code)
    }

    fn strip_formatting(self) -> Cow<'a, str> {
        if !self.is_formatted() {
            return Cow::Borrowed(self);
        }

        let mut result = String::with_capacity(self.len());
        for segment in Scanner::new(self) {
            if let Segment::Text(text) = segment {
                result.push_str(text);
            }
        }
        Cow::Owned(result)
    }
}

impl FormattedStringExt<'static> for String {
    fn is_formatted(&self) -> bool {
        self.as_str().is_formatted()
    }

    fn strip_formatting(self) -> Cow<'static, str> {
        match self.as_str().strip_formatting() {
            Cow::Borrowed(_) => Cow::Owned(self),
            Cow::Owned(stripped) => Cow::Owned(stripped),
        }
    }
}
