//! CTCP (Client-to-Client Protocol) handling.
//!
//! CTCP payloads travel inside PRIVMSG and NOTICE bodies, wrapped in the
//! `\x01` delimiter. This module splits a body into its CTCP payloads and
//! residual text ([`demux`]), parses a payload into a [`CtcpMessage`],
//! answers queries through [`CtcpEngine`], and builds outgoing payloads.
//!
//! Whether a payload is a query or a reply depends only on the IRC command
//! that carried it: PRIVMSG carries queries and NOTICE carries replies.
//! Callers pass that in; it is never guessed from the payload.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>
//!
//! # Example
//!
//! ```
//! use slirc_engine::ctcp::{self, Ctcp, CtcpKind};
//!
//! let demuxed = ctcp::demux("\x01ACTION waves hello\x01");
//! assert_eq!(demuxed.ctcp, vec!["ACTION waves hello"]);
//! assert!(demuxed.residual.is_none());
//!
//! let action = Ctcp::action("dances");
//! assert_eq!(action.kind, CtcpKind::Action);
//! assert_eq!(action.to_string(), "\x01ACTION dances\x01");
//! ```

mod handlers;
mod ping;

pub use handlers::{
    known_commands, ClientInfo, CtcpEngine, CtcpEvent, CtcpOutcome, HookResult, UnknownCtcpHook,
};
pub use ping::PingTracker;

use std::borrow::Cow;
use std::fmt;

use crate::error::CtcpError;

/// The CTCP delimiter character (`\x01`).
pub const DELIMITER: char = '\x01';

/// Known CTCP command types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION - describes an action performed by the user (`/me`).
    Action,
    /// VERSION - client name and version.
    Version,
    /// PING - round-trip measurement with an opaque payload.
    Ping,
    /// TIME - local time of the client.
    Time,
    /// USERINFO - user-defined string.
    Userinfo,
    /// CLIENTINFO - supported commands or a command's description.
    Clientinfo,
    /// SOURCE - where to get the client.
    Source,
    /// FINGER - legacy user information.
    Finger,
    /// ERRMSG - error reply to a query.
    Errmsg,
    /// Any other command, as sent.
    Unknown(String),
}

impl CtcpKind {
    /// Parse a CTCP command name, ignoring case.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            "USERINFO" => Self::Userinfo,
            "CLIENTINFO" => Self::Clientinfo,
            "SOURCE" => Self::Source,
            "FINGER" => Self::Finger,
            "ERRMSG" => Self::Errmsg,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// Canonical uppercase name of this command.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Userinfo => "USERINFO",
            Self::Clientinfo => "CLIENTINFO",
            Self::Source => "SOURCE",
            Self::Finger => "FINGER",
            Self::Errmsg => "ERRMSG",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing CTCP payload: command plus optional parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The CTCP command type.
    pub kind: CtcpKind,
    /// Parameters following the command.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// An ACTION payload.
    pub fn action(text: &'a str) -> Self {
        Self {
            kind: CtcpKind::Action,
            params: Some(text),
        }
    }

    /// A payload for an arbitrary command.
    pub fn custom(command: &str, params: Option<&'a str>) -> Self {
        Self {
            kind: CtcpKind::parse(command),
            params: params.filter(|p| !p.is_empty()),
        }
    }

    /// Inner text without delimiters, e.g. `PING 123`.
    pub fn inner(&self) -> String {
        match self.params.filter(|p| !p.is_empty()) {
            Some(params) => format!("{} {}", self.kind, params),
            None => self.kind.to_string(),
        }
    }

    /// Validate and wrap the payload in delimiters.
    pub fn encode(&self) -> Result<String, CtcpError> {
        encode(&self.inner())
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DELIMITER, self.kind)?;
        if let Some(params) = self.params.filter(|p| !p.is_empty()) {
            write!(f, " {}", params)?;
        }
        write!(f, "{}", DELIMITER)
    }
}

/// Wrap `text` in the CTCP delimiter pair.
///
/// Empty text and text that already contains the delimiter are rejected.
pub fn encode(text: &str) -> Result<String, CtcpError> {
    if text.is_empty() {
        return Err(CtcpError::EmptyPayload);
    }
    if text.contains(DELIMITER) {
        return Err(CtcpError::EmbeddedDelimiter);
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push(DELIMITER);
    out.push_str(text);
    out.push(DELIMITER);
    Ok(out)
}

/// Strip the delimiters from a body that is a single CTCP payload.
///
/// Returns `None` when the body does not start with the delimiter. A
/// missing closing delimiter is tolerated.
pub fn decode(body: &str) -> Option<&str> {
    let inner = body.strip_prefix(DELIMITER)?;
    Some(inner.strip_suffix(DELIMITER).unwrap_or(inner))
}

/// A message body split into CTCP payloads and plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Demuxed<'a> {
    /// Delimited payloads in order, delimiters stripped.
    pub ctcp: Vec<&'a str>,
    /// Text outside the delimiters, concatenated; `None` when there is none.
    pub residual: Option<Cow<'a, str>>,
}

impl Demuxed<'_> {
    /// Whether the body carried any CTCP payload.
    pub fn is_ctcp(&self) -> bool {
        !self.ctcp.is_empty()
    }
}

/// Split a message body into CTCP payloads and residual text.
///
/// A body without any `\x01` is not CTCP and comes back whole as the
/// residual. Empty payloads are skipped. An unterminated trailing payload
/// is accepted.
pub fn demux(body: &str) -> Demuxed<'_> {
    if !body.contains(DELIMITER) {
        return Demuxed {
            ctcp: Vec::new(),
            residual: Some(Cow::Borrowed(body)),
        };
    }

    let mut ctcp = Vec::new();
    let mut residual = String::new();
    for (i, segment) in body.split(DELIMITER).enumerate() {
        if i % 2 == 1 {
            if !segment.is_empty() {
                ctcp.push(segment);
            }
        } else {
            residual.push_str(segment);
        }
    }

    Demuxed {
        ctcp,
        residual: (!residual.is_empty()).then_some(Cow::Owned(residual)),
    }
}

/// A received CTCP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CtcpMessage {
    kind: CtcpKind,
    command: String,
    content: String,
    is_query: bool,
    channel: Option<String>,
    sender: String,
}

impl CtcpMessage {
    /// Parse one payload (delimiters already stripped).
    ///
    /// The first space-delimited token is the command; everything after the
    /// first space is the content. `is_query` comes from the carrying IRC
    /// command. `channel` is set when the message was sent to a channel.
    pub fn parse(
        inner: &str,
        is_query: bool,
        channel: Option<&str>,
        sender: &str,
    ) -> Result<Self, CtcpError> {
        if sender.is_empty() {
            return Err(CtcpError::MissingSender);
        }

        let (command, content) = inner.split_once(' ').unwrap_or((inner, ""));
        if command.is_empty() {
            return Err(CtcpError::EmptyPayload);
        }

        Ok(Self {
            kind: CtcpKind::parse(command),
            command: command.to_owned(),
            content: content.to_owned(),
            is_query,
            channel: channel.map(str::to_owned),
            sender: sender.to_owned(),
        })
    }

    /// The command type.
    pub fn kind(&self) -> &CtcpKind {
        &self.kind
    }

    /// The command name as sent.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Content after the command; may be empty.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// `true` for queries (PRIVMSG), `false` for replies (NOTICE).
    pub fn is_query(&self) -> bool {
        self.is_query
    }

    /// Channel the message was addressed to, if any.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Nickname of the sender.
    pub fn sender(&self) -> &str {
        &self.sender
    }
}
