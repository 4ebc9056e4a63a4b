//! Sans-IO client session.
//!
//! [`Session`] ties the layers together without doing any I/O itself. It
//! consumes received lines and user input, and produces a [`Reaction`]: the
//! protocol lines to send and the events to show. The caller moves lines
//! between the session and a [`Connection`](crate::transport::Connection),
//! or any other transport.
//!
//! - Server `PING` is answered with `PONG`.
//! - PRIVMSG and NOTICE bodies are split into CTCP payloads, which go
//!   through the [`CtcpEngine`], and plain text, which becomes a
//!   [`SessionEvent::Message`] with a highlight flag.
//! - User input goes through the [`Dispatcher`].
//!
//! # Example
//!
//! ```
//! use slirc_engine::session::{Session, SessionConfig, SessionEvent};
//!
//! let session = Session::new(SessionConfig {
//!     nickname: "leeroy".to_string(),
//!     ..SessionConfig::default()
//! });
//!
//! let reaction = session.receive("PING :irc.example.net").unwrap();
//! assert_eq!(reaction.lines, vec!["PONG :irc.example.net"]);
//!
//! let reaction = session.input("/me charges in", Some("#channel"));
//! assert_eq!(reaction.lines, vec!["PRIVMSG #channel :\x01ACTION charges in\x01"]);
//! ```

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::casemap::irc_eq;
use crate::chan::is_channel_name;
use crate::command::{DispatchConfig, Dispatcher, Outbound};
use crate::ctcp::{self, ClientInfo, Ctcp, CtcpEngine, CtcpEvent, CtcpKind, CtcpMessage, CtcpOutcome};
use crate::error::{CtcpError, ProtocolError};
use crate::format;
use crate::message::Line;

/// Session settings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Initial nickname; updated from the welcome numeric and NICK.
    pub nickname: String,
    /// Identity used for CTCP replies.
    pub client_info: ClientInfo,
    /// Slash-command settings.
    pub dispatch: DispatchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            nickname: "slirc".to_string(),
            client_info: ClientInfo::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

/// Something to show the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Plain text received in a PRIVMSG or NOTICE.
    Message {
        /// Channel, or `None` for a private message.
        channel: Option<String>,
        /// Sender nickname, or the server name.
        sender: String,
        /// Message text, formatting codes included.
        text: String,
        /// Carried by NOTICE.
        notice: bool,
        /// Mentions our nickname.
        highlight: bool,
    },
    /// A CTCP event.
    Ctcp(CtcpEvent),
    /// We sent a message the user should see echoed.
    Sent {
        /// Channel or nickname.
        target: String,
        /// Message text.
        text: String,
    },
    /// We sent an action.
    SentAction {
        /// Channel or nickname.
        target: String,
        /// Action text.
        text: String,
    },
    /// A line the session does not interpret.
    Raw(String),
}

/// Lines to send and events to show, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Protocol lines, without terminators.
    pub lines: Vec<String>,
    /// Events for the presentation layer.
    pub events: Vec<SessionEvent>,
}

impl Reaction {
    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.events.is_empty()
    }
}

/// Client-side protocol state for one server connection.
#[derive(Debug)]
pub struct Session {
    nickname: RwLock<String>,
    ctcp: CtcpEngine,
    dispatcher: Dispatcher,
}

impl Session {
    /// Create a session with the default CTCP engine.
    pub fn new(config: SessionConfig) -> Self {
        let engine = CtcpEngine::new(config.client_info.clone());
        Self::with_engine(config, engine)
    }

    /// Create a session with a preconfigured CTCP engine.
    ///
    /// `config.client_info` is ignored in favour of the engine's.
    pub fn with_engine(config: SessionConfig, engine: CtcpEngine) -> Self {
        Self {
            nickname: RwLock::new(config.nickname),
            ctcp: engine,
            dispatcher: Dispatcher::new(config.dispatch),
        }
    }

    /// Our current nickname.
    pub fn nickname(&self) -> String {
        self.nickname.read().clone()
    }

    /// The CTCP engine, including its outstanding pings.
    pub fn ctcp(&self) -> &CtcpEngine {
        &self.ctcp
    }

    /// The command dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn channel_types(&self) -> &str {
        &self.dispatcher.config().channel_types
    }

    /// Process one received line.
    pub fn receive(&self, raw: &str) -> Result<Reaction, ProtocolError> {
        let line = Line::parse(raw)?;
        let mut reaction = Reaction::default();

        if line.is("PING") {
            let pong = match line.param(0) {
                Some(token) => format!("PONG :{}", token),
                None => "PONG".to_string(),
            };
            reaction.lines.push(pong);
        } else if line.is("PRIVMSG") || line.is("NOTICE") {
            self.receive_message(&line, raw, &mut reaction);
        } else {
            if line.is("001") {
                if let Some(nick) = line.param(0) {
                    self.set_nickname(nick);
                }
            } else if line.is("NICK") {
                if let (Some(old), Some(new)) = (line.source_nickname(), line.param(0)) {
                    if irc_eq(old, &self.nickname.read()) {
                        self.set_nickname(new);
                    }
                }
            }
            reaction.events.push(SessionEvent::Raw(raw.to_owned()));
        }

        Ok(reaction)
    }

    fn set_nickname(&self, nick: &str) {
        let mut current = self.nickname.write();
        if *current != nick {
            debug!(old = %current, new = nick, "nickname changed");
            *current = nick.to_owned();
        }
    }

    fn receive_message(&self, line: &Line<'_>, raw: &str, reaction: &mut Reaction) {
        let (Some(target), Some(body)) = (line.param(0), line.param(1)) else {
            reaction.events.push(SessionEvent::Raw(raw.to_owned()));
            return;
        };
        let notice = line.is("NOTICE");
        let sender = line
            .source_nickname()
            .or(line.prefix)
            .unwrap_or_default();
        let channel = is_channel_name(target, self.channel_types()).then_some(target);

        let demuxed = ctcp::demux(body);
        for inner in &demuxed.ctcp {
            match CtcpMessage::parse(inner, !notice, channel, sender) {
                Ok(msg) => self.apply_ctcp(&msg, reaction),
                Err(e) => warn!(sender, "dropping CTCP payload: {}", e),
            }
        }

        if let Some(text) = demuxed.residual {
            let highlight = format::contains_word(&text, &self.nickname.read());
            reaction.events.push(SessionEvent::Message {
                channel: channel.map(str::to_owned),
                sender: sender.to_owned(),
                text: text.into_owned(),
                notice,
                highlight,
            });
        }
    }

    fn apply_ctcp(&self, msg: &CtcpMessage, reaction: &mut Reaction) {
        for outcome in self.ctcp.handle(msg) {
            match outcome {
                CtcpOutcome::Reply { target, payload } => match ctcp::encode(&payload) {
                    Ok(envelope) => reaction.lines.push(notice_line(&target, &envelope)),
                    Err(e) => warn!(target = %target, "cannot encode CTCP reply: {}", e),
                },
                CtcpOutcome::Event(event) => reaction.events.push(SessionEvent::Ctcp(event)),
            }
        }
    }

    /// Process one line of user input; `active` is the focused conversation.
    pub fn input(&self, text: &str, active: Option<&str>) -> Reaction {
        let mut reaction = Reaction::default();
        for outbound in self.dispatcher.dispatch(text, active) {
            if let Err(e) = self.apply_outbound(outbound, &mut reaction) {
                warn!("dropping command output: {}", e);
            }
        }
        reaction
    }

    fn apply_outbound(&self, outbound: Outbound, reaction: &mut Reaction) -> Result<(), CtcpError> {
        match outbound {
            Outbound::Message { target, text, echo } => {
                reaction.lines.push(self.send_message(&target, &text));
                if echo {
                    reaction.events.push(SessionEvent::Sent { target, text });
                }
            }
            Outbound::Notice { target, text } => {
                reaction.lines.push(notice_line(&target, &text));
            }
            Outbound::Action { target, text } => {
                reaction.lines.push(self.send_action(&target, &text)?);
                reaction.events.push(SessionEvent::SentAction { target, text });
            }
            Outbound::CtcpQuery {
                target,
                command,
                content,
            } => {
                reaction.lines.push(self.send_ctcp(&target, &command, &content)?);
            }
            Outbound::Raw(line) => {
                trace!(line = %line, "raw command");
                reaction.lines.push(line);
            }
        }
        Ok(())
    }

    /// `PRIVMSG` line for `text`.
    pub fn send_message(&self, target: &str, text: &str) -> String {
        format!("PRIVMSG {} :{}", target, text)
    }

    /// `PRIVMSG` line carrying a CTCP ACTION.
    ///
    /// `send_action("#channel", "leeroy")` gives
    /// `PRIVMSG #channel :\x01ACTION leeroy\x01`.
    pub fn send_action(&self, target: &str, text: &str) -> Result<String, CtcpError> {
        let envelope = Ctcp::action(text).encode()?;
        Ok(format!("PRIVMSG {} :{}", target, envelope))
    }

    /// `PRIVMSG` line carrying a CTCP query.
    ///
    /// PING queries are recorded so the reply can be timed. A PING without
    /// content gets a timestamp token.
    pub fn send_ctcp(&self, target: &str, command: &str, content: &str) -> Result<String, CtcpError> {
        let is_ping = CtcpKind::parse(command) == CtcpKind::Ping;
        if is_ping && content.is_empty() {
            let envelope = ctcp::encode(&self.ctcp.ping_query(target))?;
            return Ok(format!("PRIVMSG {} :{}", target, envelope));
        }

        let envelope = Ctcp::custom(command, Some(content)).encode()?;
        if is_ping {
            self.ctcp.pings().record(target);
        }
        Ok(format!("PRIVMSG {} :{}", target, envelope))
    }
}

fn notice_line(target: &str, text: &str) -> String {
    format!("NOTICE {} :{}", target, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SessionConfig {
            nickname: "leeroy".to_string(),
            ..SessionConfig::default()
        })
    }

    #[test]
    fn test_ping_pong() {
        let s = session();
        assert_eq!(s.receive("PING :abc").unwrap().lines, vec!["PONG :abc"]);
        assert_eq!(s.receive("PING").unwrap().lines, vec!["PONG"]);
    }

    #[test]
    fn test_channel_message_with_highlight() {
        let reaction = session()
            .receive(":alice!a@h PRIVMSG #rust :hey Leeroy, lunch?")
            .unwrap();
        assert!(reaction.lines.is_empty());
        assert_eq!(
            reaction.events,
            vec![SessionEvent::Message {
                channel: Some("#rust".into()),
                sender: "alice".into(),
                text: "hey Leeroy, lunch?".into(),
                notice: false,
                highlight: true,
            }]
        );
    }

    #[test]
    fn test_server_notice_uses_prefix() {
        let reaction = session()
            .receive(":irc.example.net NOTICE * :*** Looking up your hostname")
            .unwrap();
        assert!(matches!(
            &reaction.events[..],
            [SessionEvent::Message { sender, notice: true, channel: None, highlight: false, .. }]
                if sender == "irc.example.net"
        ));
    }

    #[test]
    fn test_version_query_answered_by_notice() {
        let reaction = session()
            .receive(":bob!b@h PRIVMSG leeroy :\x01VERSION\x01")
            .unwrap();
        assert_eq!(reaction.lines.len(), 1);
        assert!(reaction.lines[0].starts_with("NOTICE bob :\x01VERSION slirc-engine "));
        assert!(reaction.events.is_empty());
    }

    #[test]
    fn test_mixed_body_keeps_residual() {
        let reaction = session()
            .receive(":bob!b@h PRIVMSG #rust :look \x01ACTION waves\x01 here")
            .unwrap();
        assert_eq!(reaction.events.len(), 2);
        assert!(matches!(
            &reaction.events[1],
            SessionEvent::Message { text, .. } if text == "look  here"
        ));
    }

    #[test]
    fn test_nickname_tracking() {
        let s = session();
        s.receive(":server 001 leeroy2 :Welcome").unwrap();
        assert_eq!(s.nickname(), "leeroy2");
        s.receive(":LEEROY2!u@h NICK :jenkins").unwrap();
        assert_eq!(s.nickname(), "jenkins");
        s.receive(":other!u@h NICK :someone").unwrap();
        assert_eq!(s.nickname(), "jenkins");
    }

    #[test]
    fn test_unrouted_lines_are_raw() {
        let reaction = session().receive(":server 372 leeroy :- motd").unwrap();
        assert_eq!(
            reaction.events,
            vec![SessionEvent::Raw(":server 372 leeroy :- motd".into())]
        );
        assert!(session().receive("").is_err());
    }

    #[test]
    fn test_input_message_echo() {
        let reaction = session().input("hello", Some("#rust"));
        assert_eq!(reaction.lines, vec!["PRIVMSG #rust :hello"]);
        assert_eq!(
            reaction.events,
            vec![SessionEvent::Sent {
                target: "#rust".into(),
                text: "hello".into(),
            }]
        );
    }

    #[test]
    fn test_ctcp_ping_is_recorded() {
        let s = session();
        let reaction = s.input("/ctcp ping bob", None);
        assert_eq!(reaction.lines.len(), 1);
        assert!(reaction.lines[0].starts_with("PRIVMSG bob :\x01PING "));
        assert_eq!(s.ctcp().pings().outstanding("bob"), 1);

        let line = s.send_ctcp("bob", "PING", "token").unwrap();
        assert_eq!(line, "PRIVMSG bob :\x01PING token\x01");
        assert_eq!(s.ctcp().pings().outstanding("bob"), 2);

        assert_eq!(
            s.send_ctcp("bob", "PING", "bad\x01").unwrap_err(),
            CtcpError::EmbeddedDelimiter
        );
        assert_eq!(s.ctcp().pings().outstanding("bob"), 2);
    }

    #[test]
    fn test_send_action() {
        assert_eq!(
            session().send_action("#channel", "leeroy").unwrap(),
            "PRIVMSG #channel :\x01ACTION leeroy\x01"
        );
    }
}
