//! Styled text runs and the lazy run iterator.

use unicode_general_category::{get_general_category, GeneralCategory};

use super::scan::{Code, Scanner, Segment};
use super::IrcColor;

/// Kind of a tokenized piece of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartKind {
    /// A word, or a whole token kept by the exclusion predicate.
    Word,
    /// Leading or trailing punctuation of a token.
    Punctuation,
    /// A run of whitespace.
    Space,
}

/// One token of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextPart {
    /// Token kind.
    pub kind: PartKind,
    /// Token text.
    pub text: String,
}

impl TextPart {
    fn new(kind: PartKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_owned(),
        }
    }
}

/// A span of text sharing one formatting state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    /// Bold is on.
    pub bold: bool,
    /// Underline is on.
    pub underline: bool,
    /// Foreground, after reverse video was applied.
    pub foreground: IrcColor,
    /// Background, after reverse video was applied.
    pub background: IrcColor,
    /// Tokens in order; never empty.
    pub parts: Vec<TextPart>,
}

impl TextRun {
    /// The run's text with all parts joined.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Punctuation test used for splitting tokens.
///
/// Any character in a Unicode punctuation category (`Pc`, `Pd`, `Ps`,
/// `Pe`, `Pi`, `Pf`, `Po`) except `#`, so channel names stay whole. Math
/// and currency symbols (`$ + < = > ^ | ~` and the backtick) are not
/// punctuation.
pub fn is_punctuation(c: char) -> bool {
    use GeneralCategory::*;

    if c == '#' {
        return false;
    }
    matches!(
        get_general_category(c),
        ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
    )
}

/// Split `text` into space, word and punctuation parts.
pub(crate) fn tokenize(text: &str, exclude: &dyn Fn(&str) -> bool, parts: &mut Vec<TextPart>) {
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        let is_space = first.is_whitespace();
        let end = rest
            .find(|c: char| c.is_whitespace() != is_space)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        rest = tail;

        if is_space {
            parts.push(TextPart::new(PartKind::Space, token));
        } else if exclude(token) {
            parts.push(TextPart::new(PartKind::Word, token));
        } else {
            split_word(token, parts);
        }
    }
}

fn split_word(token: &str, parts: &mut Vec<TextPart>) {
    let Some(start) = token.find(|c: char| !is_punctuation(c)) else {
        parts.push(TextPart::new(PartKind::Punctuation, token));
        return;
    };
    let end = token
        .char_indices()
        .rev()
        .find(|(_, c)| !is_punctuation(*c))
        .map_or(token.len(), |(i, c)| i + c.len_utf8());

    if start > 0 {
        parts.push(TextPart::new(PartKind::Punctuation, &token[..start]));
    }
    parts.push(TextPart::new(PartKind::Word, &token[start..end]));
    if end < token.len() {
        parts.push(TextPart::new(PartKind::Punctuation, &token[end..]));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Style {
    bold: bool,
    underline: bool,
    reverse: bool,
    /// Color slots: 0 is unset, otherwise the mIRC code plus one.
    fg: u8,
    bg: u8,
}

impl Style {
    fn apply(self, code: Code) -> Self {
        let mut next = self;
        match code {
            Code::Bold => next.bold = !next.bold,
            Code::Underline => next.underline = !next.underline,
            Code::Reverse => next.reverse = !next.reverse,
            Code::Reset => next = Self::default(),
            Code::Color { fg: None, bg: None } => {
                next.fg = 0;
                next.bg = 0;
            }
            Code::Color { fg, bg } => {
                if let Some(slot) = fg.and_then(IrcColor::slot) {
                    next.fg = slot;
                }
                if let Some(slot) = bg.and_then(IrcColor::slot) {
                    next.bg = slot;
                }
            }
            Code::Ignored => {}
        }
        next
    }

    fn colors(&self) -> (IrcColor, IrcColor) {
        let fg = IrcColor::from_slot(self.fg);
        let bg = IrcColor::from_slot(self.bg);
        if !self.reverse {
            return (fg, bg);
        }
        match (self.fg, self.bg) {
            (0, 0) => (IrcColor::ReversedDefault, IrcColor::ReversedDefault),
            (0, _) => (IrcColor::ReversedDefault, bg),
            (_, 0) => (IrcColor::ReversedDefault, fg),
            _ => (bg, fg),
        }
    }
}

/// Lazy iterator over the [`TextRun`]s of a message.
///
/// Created by [`parse`](super::parse) and [`parse_with`](super::parse_with).
/// Runs are built on demand in a single pass; the iterator cannot be
/// restarted.
pub struct Runs<'a, F> {
    scanner: Scanner<'a>,
    exclude: F,
    style: Style,
    pending: String,
}

impl<'a, F> Runs<'a, F>
where
    F: Fn(&str) -> bool,
{
    pub(crate) fn new(text: &'a str, exclude: F) -> Self {
        Self {
            scanner: Scanner::new(text),
            exclude,
            style: Style::default(),
            pending: String::new(),
        }
    }

    fn flush(&mut self) -> Option<TextRun> {
        if self.pending.is_empty() {
            return None;
        }

        let mut parts = Vec::new();
        tokenize(&self.pending, &self.exclude, &mut parts);
        self.pending.clear();

        let (foreground, background) = self.style.colors();
        Some(TextRun {
            bold: self.style.bold,
            underline: self.style.underline,
            foreground,
            background,
            parts,
        })
    }
}

impl<F> Iterator for Runs<'_, F>
where
    F: Fn(&str) -> bool,
{
    type Item = TextRun;

    fn next(&mut self) -> Option<TextRun> {
        loop {
            let Some(segment) = self.scanner.next() else {
                break;
            };
            match segment {
                Segment::Text(text) => self.pending.push_str(text),
                Segment::Code(code) => {
                    let next = self.style.apply(code);
                    if next == self.style {
                        continue;
                    }
                    let run = self.flush();
                    self.style = next;
                    if run.is_some() {
                        return run;
                    }
                }
            }
        }
        self.flush()
    }
}

impl<F> std::iter::FusedIterator for Runs<'_, F> where F: Fn(&str) -> bool {}

impl<F> std::fmt::Debug for Runs<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runs")
            .field("style", &self.style)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str, expected: &[(PartKind, &str)]) {
        let mut out = Vec::new();
        tokenize(text, &|_| false, &mut out);
        let got: Vec<(PartKind, &str)> = out.iter().map(|p| (p.kind, p.text.as_str())).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_words_and_spaces() {
        use PartKind::*;
        check("hi  there", &[(Word, "hi"), (Space, "  "), (Word, "there")]);
    }

    #[test]
    fn test_tokenize_punctuation() {
        use PartKind::*;
        check(
            "(hello), world!",
            &[
                (Punctuation, "("),
                (Word, "hello"),
                (Punctuation, "),"),
                (Space, " "),
                (Word, "world"),
                (Punctuation, "!"),
            ],
        );
        check("...", &[(Punctuation, "...")]);
    }

    #[test]
    fn test_hash_is_not_punctuation() {
        use PartKind::*;
        check(
            "join #rust.",
            &[(Word, "join"), (Space, " "), (Word, "#rust"), (Punctuation, ".")],
        );
    }

    #[test]
    fn test_inner_punctuation_stays_in_word() {
        use PartKind::*;
        check("don't", &[(Word, "don't")]);
        check("«ça»", &[(Punctuation, "«"), (Word, "ça"), (Punctuation, "»")]);
    }

    #[test]
    fn test_exclusion_keeps_token_whole() {
        let mut out = Vec::new();
        tokenize(":-) ok", &|w| w == ":-)", &mut out);
        assert_eq!(out[0], TextPart::new(PartKind::Word, ":-)"));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_symbols_are_not_punctuation() {
        for c in ['$', '+', '<', '=', '>', '^', '`', '|', '~', '#', 'a'] {
            assert!(!is_punctuation(c), "{c:?}");
        }
        for c in ['!', '.', ',', '(', '@', '¿', '…', '、'] {
            assert!(is_punctuation(c), "{c:?}");
        }
    }

    #[test]
    fn test_non_latin_punctuation() {
        use PartKind::*;
        for c in ['\u{060C}', '\u{061F}', '\u{0964}', '\u{055E}', '\u{2E2E}', '\u{FE50}'] {
            assert!(is_punctuation(c), "{c:?}");
        }
        check(
            "مرحبا، عالم؟",
            &[
                (Word, "مرحبا"),
                (Punctuation, "،"),
                (Space, " "),
                (Word, "عالم"),
                (Punctuation, "؟"),
            ],
        );
    }

    #[test]
    fn test_reverse_colors() {
        let style = |fg, bg| Style {
            reverse: true,
            fg,
            bg,
            ..Style::default()
        };
        assert_eq!(
            style(0, 0).colors(),
            (IrcColor::ReversedDefault, IrcColor::ReversedDefault)
        );
        assert_eq!(
            style(0, 3).colors(),
            (IrcColor::ReversedDefault, IrcColor::Blue)
        );
        assert_eq!(
            style(5, 0).colors(),
            (IrcColor::ReversedDefault, IrcColor::Red)
        );
        assert_eq!(style(5, 3).colors(), (IrcColor::Blue, IrcColor::Red));
    }

    #[test]
    fn test_out_of_range_color_keeps_component() {
        let style = Style::default().apply(Code::Color {
            fg: Some(4),
            bg: Some(2),
        });
        let next = style.apply(Code::Color {
            fg: Some(99),
            bg: Some(3),
        });
        assert_eq!(next.fg, 5);
        assert_eq!(next.bg, 4);
    }
}
