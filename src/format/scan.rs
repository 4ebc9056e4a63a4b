//! Control-code scanner.
//!
//! Splits message text into plain text slices and decoded control codes.
//! Control codes recognised here:
//! - 0x02 (^B): Bold
//! - 0x03 (^C): Color, followed by optional `fg[,bg]` of up to two digits each
//! - 0x04: Hex color, followed by optional `RRGGBB[,RRGGBB]`
//! - 0x0F (^O): Reset all formatting
//! - 0x11: Monospace
//! - 0x16 (^V): Reverse
//! - 0x1D: Italic
//! - 0x1E: Strikethrough
//! - 0x1F (^_): Underline

const BOLD: char = '\x02';
const COLOR: char = '\x03';
const HEX_COLOR: char = '\x04';
const RESET: char = '\x0F';
const MONOSPACE: char = '\x11';
const REVERSE: char = '\x16';
const ITALIC: char = '\x1D';
const STRIKETHROUGH: char = '\x1E';
const UNDERLINE: char = '\x1F';

/// Returns true if `c` introduces a formatting code.
#[inline]
pub fn is_format_code(c: char) -> bool {
    matches!(
        c,
        BOLD | COLOR | HEX_COLOR | RESET | MONOSPACE | REVERSE | ITALIC | STRIKETHROUGH | UNDERLINE
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Code {
    Bold,
    Underline,
    Reverse,
    Reset,
    /// Numeric color; both `None` means end-of-color.
    Color {
        fg: Option<u8>,
        bg: Option<u8>,
    },
    /// Recognised but not rendered.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Code(Code),
}

/// Single-pass iterator over the segments of a message.
#[derive(Clone, Debug)]
pub(crate) struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn take_while(&mut self, max: usize, pred: impl Fn(u8) -> bool) -> &'a str {
        let len = self
            .rest
            .bytes()
            .take(max)
            .take_while(|b| pred(*b))
            .count();
        let (taken, rest) = self.rest.split_at(len);
        self.rest = rest;
        taken
    }

    /// Consume `,` only if it is followed by a byte matching `pred`.
    fn comma_then(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        match self.rest.as_bytes() {
            [b',', next, ..] if pred(*next) => {
                self.rest = &self.rest[1..];
                true
            }
            _ => false,
        }
    }

    fn color(&mut self) -> Code {
        let fg = self.take_while(2, |b| b.is_ascii_digit());
        let bg = if self.comma_then(|b| b.is_ascii_digit()) {
            self.take_while(2, |b| b.is_ascii_digit())
        } else {
            ""
        };
        Code::Color {
            fg: fg.parse().ok(),
            bg: bg.parse().ok(),
        }
    }

    fn hex_color(&mut self) -> Code {
        self.take_while(6, |b| b.is_ascii_hexdigit());
        if self.comma_then(|b| b.is_ascii_hexdigit()) {
            self.take_while(6, |b| b.is_ascii_hexdigit());
        }
        Code::Ignored
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        let mut chars = self.rest.chars();
        let c = chars.next()?;

        if !is_format_code(c) {
            let end = self.rest.find(is_format_code).unwrap_or(self.rest.len());
            let (text, rest) = self.rest.split_at(end);
            self.rest = rest;
            return Some(Segment::Text(text));
        }

        self.rest = chars.as_str();
        let code = match c {
            BOLD => Code::Bold,
            UNDERLINE => Code::Underline,
            REVERSE => Code::Reverse,
            RESET => Code::Reset,
            COLOR => self.color(),
            HEX_COLOR => self.hex_color(),
            _ => Code::Ignored,
        };
        Some(Segment::Code(code))
    }
}
