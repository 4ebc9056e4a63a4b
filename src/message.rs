//! Minimal IRC line grammar.
//!
//! Only enough of the message grammar to route received lines: optional
//! IRCv3 tags, optional prefix, the command and its parameters. Tags are
//! kept as one raw slice and never interpreted.
//!
//! ```text
//! [@tags] [:prefix] <command> [params...] [:trailing]
//! ```

use nom::{
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::{context, VerboseError, VerboseErrorKind},
    sequence::preceded,
    IResult,
};

use crate::error::{MessageParseError, ProtocolError};

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message tags",
        preceded(char('@'), take_till1(|c| c == ' ')),
    )(input)
}

fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_till1(|c| c == ' ')),
    )(input)
}

fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing IRC command",
        take_while1(|c: char| c.is_ascii_alphanumeric()),
    )(input)
}

fn parse_line(input: &str) -> ParseResult<&str, Line<'_>> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (mut rest, command) = parse_command(input)?;

    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            rest = "";
            break;
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    Ok((
        rest,
        Line {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

/// One received IRC line, borrowing from the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// Raw tag string without the leading `@`.
    pub tags: Option<&'a str>,
    /// Raw prefix without the leading `:`.
    pub prefix: Option<&'a str>,
    /// Command name or three-digit numeric, as sent.
    pub command: &'a str,
    /// Parameters; the trailing parameter, if any, is last.
    pub params: Vec<&'a str>,
}

impl<'a> Line<'a> {
    /// Parse a line without its terminator.
    ///
    /// ```
    /// use slirc_engine::message::Line;
    ///
    /// let line = Line::parse(":nick!user@host PRIVMSG #rust :hello there").unwrap();
    /// assert_eq!(line.source_nickname(), Some("nick"));
    /// assert!(line.is("privmsg"));
    /// assert_eq!(line.params, vec!["#rust", "hello there"]);
    /// ```
    pub fn parse(input: &'a str) -> Result<Self, ProtocolError> {
        let trimmed = input.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            return Err(invalid(input, MessageParseError::EmptyMessage));
        }

        match parse_line(trimmed) {
            Ok((_, line)) => Ok(line),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let (position, context) = describe(trimmed, &e);
                Err(invalid(
                    input,
                    MessageParseError::ParseContext { position, context },
                ))
            }
            Err(nom::Err::Incomplete(_)) => Err(invalid(
                input,
                MessageParseError::ParseContext {
                    position: trimmed.len(),
                    context: "incomplete input".to_string(),
                },
            )),
        }
    }

    /// Nickname part of the prefix (`nick` in `nick!user@host`).
    pub fn source_nickname(&self) -> Option<&'a str> {
        let prefix = self.prefix?;
        let end = prefix.find(['!', '@']).unwrap_or(prefix.len());
        Some(&prefix[..end]).filter(|nick| !nick.is_empty())
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&'a str> {
        self.params.get(index).copied()
    }

    /// Case-insensitive command comparison.
    pub fn is(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }
}

fn invalid(input: &str, cause: MessageParseError) -> ProtocolError {
    ProtocolError::InvalidMessage {
        string: input.to_owned(),
        cause,
    }
}

fn describe(input: &str, error: &VerboseError<&str>) -> (usize, String) {
    let mut position = input.len();
    let mut context = "unexpected input".to_string();
    for (rest, kind) in &error.errors {
        position = input.len() - rest.len();
        if let VerboseErrorKind::Context(ctx) = kind {
            context = (*ctx).to_string();
        }
    }
    (position, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let line = Line::parse("PING").unwrap();
        assert_eq!(line.command, "PING");
        assert!(line.tags.is_none());
        assert!(line.prefix.is_none());
        assert!(line.params.is_empty());
    }

    #[test]
    fn test_parse_with_tags_and_prefix() {
        let line = Line::parse("@time=2023-01-01T00:00:00Z :nick PRIVMSG #ch :Hi").unwrap();
        assert_eq!(line.tags, Some("time=2023-01-01T00:00:00Z"));
        assert_eq!(line.prefix, Some("nick"));
        assert_eq!(line.params, vec!["#ch", "Hi"]);
    }

    #[test]
    fn test_parse_middle_and_trailing_params() {
        let line = Line::parse("USER guest 0 * :Real Name").unwrap();
        assert_eq!(line.params, vec!["guest", "0", "*", "Real Name"]);
        assert_eq!(line.param(3), Some("Real Name"));
        assert_eq!(line.param(4), None);
    }

    #[test]
    fn test_trailing_keeps_colons_and_spaces() {
        let line = Line::parse("PRIVMSG #a :: a  b :c").unwrap();
        assert_eq!(line.params, vec!["#a", ": a  b :c"]);

        let line = Line::parse("PRIVMSG #a :").unwrap();
        assert_eq!(line.params, vec!["#a", ""]);
    }

    #[test]
    fn test_parse_numeric_and_crlf() {
        let line = Line::parse(":server 001 nick :Welcome\r\n").unwrap();
        assert_eq!(line.command, "001");
        assert_eq!(line.source_nickname(), Some("server"));
        assert_eq!(line.params, vec!["nick", "Welcome"]);
    }

    #[test]
    fn test_source_nickname() {
        let line = Line::parse(":alice!a@example.org NOTICE bob :x").unwrap();
        assert_eq!(line.source_nickname(), Some("alice"));
        assert!(line.is("notice"));
        assert!(Line::parse("NOTICE bob :x").unwrap().source_nickname().is_none());
    }

    #[test]
    fn test_empty_line_rejected() {
        let err = Line::parse("\r\n").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidMessage {
                cause: MessageParseError::EmptyMessage,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_command_rejected() {
        let err = Line::parse(":prefix.only ").unwrap_err();
        match err {
            ProtocolError::InvalidMessage {
                cause: MessageParseError::ParseContext { context, .. },
                ..
            } => assert_eq!(context, "parsing IRC command"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
