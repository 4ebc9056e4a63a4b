//! mIRC formatting parser.
//!
//! Turns message text carrying mIRC control codes into [`TextRun`]s: spans
//! of text sharing one bold/underline/color state, each tokenized into
//! words, punctuation and whitespace.
//!
//! ```
//! use slirc_engine::format::{self, IrcColor};
//!
//! let runs: Vec<_> = format::parse("\x0304Hello\x0F World").collect();
//! assert_eq!(runs.len(), 2);
//! assert_eq!(runs[0].foreground, IrcColor::Red);
//! assert_eq!(runs[0].text(), "Hello");
//! assert_eq!(runs[1].foreground, IrcColor::Default);
//! assert_eq!(runs[1].text(), " World");
//! ```
//!
//! # Reference
//! - <https://modern.ircdocs.horse/formatting>

mod color;
mod run;
mod scan;
mod strip;

pub use color::IrcColor;
pub use run::{is_punctuation, PartKind, Runs, TextPart, TextRun};
pub use scan::is_format_code;
pub use strip::FormattedStringExt;

use crate::casemap::irc_eq;

fn no_exclusions(_: &str) -> bool {
    false
}

/// Parse `text` into styled runs.
pub fn parse(text: &str) -> Runs<'_, fn(&str) -> bool> {
    Runs::new(text, no_exclusions as fn(&str) -> bool)
}

/// Parse `text`, keeping every token for which `exclude` returns `true`
/// as one unsplit word (emoticons, for example).
pub fn parse_with<F>(text: &str, exclude: F) -> Runs<'_, F>
where
    F: Fn(&str) -> bool,
{
    Runs::new(text, exclude)
}

/// Whether `text` contains `word` as a plain word token.
///
/// Formatting codes are ignored and the comparison uses IRC case mapping,
/// so `contains_word("\x02Alice\x02: hi", "alice")` holds. Punctuation
/// around a token may belong to the word, so nicknames such as `bob_` or
/// `[m]` still match `"bob_: ping"` and `"[m]!"`.
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    text.strip_formatting()
        .split_whitespace()
        .any(|token| token_matches(token, word))
}

/// Try every split of `token` into leading punctuation, core and trailing
/// punctuation, with the core possibly keeping some of that punctuation.
fn token_matches(token: &str, word: &str) -> bool {
    let lead = token
        .find(|c: char| !is_punctuation(c))
        .unwrap_or(token.len());
    let trail = token[lead..]
        .char_indices()
        .rev()
        .find(|(_, c)| !is_punctuation(*c))
        .map_or(lead, |(i, c)| lead + i + c.len_utf8());

    let mut starts = token[..lead]
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(lead));
    starts.any(|start| {
        std::iter::once(trail)
            .chain(
                token[trail..]
                    .char_indices()
                    .map(|(i, c)| trail + i + c.len_utf8()),
            )
            .any(|end| start < end && irc_eq(&token[start..end], word))
    })
}
