//! Built-in CTCP command handlers.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::{debug, trace};

use super::{CtcpKind, CtcpMessage, PingTracker};

/// Identity strings used to answer informational queries.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientInfo {
    /// VERSION reply.
    pub version: String,
    /// FINGER reply.
    pub finger: String,
    /// USERINFO reply.
    pub userinfo: String,
    /// SOURCE reply.
    pub source: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            version: format!("slirc-engine {}", env!("CARGO_PKG_VERSION")),
            finger: String::new(),
            userinfo: String::new(),
            source: env!("CARGO_PKG_REPOSITORY").to_string(),
        }
    }
}

/// Something the application should know about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CtcpEvent {
    /// `/me` style action, sent to `channel` or privately when `None`.
    Action {
        /// Target channel.
        channel: Option<String>,
        /// Acting nickname.
        sender: String,
        /// Action text.
        text: String,
    },
    /// Answer to one of our informational queries.
    Reply {
        /// Replying nickname.
        sender: String,
        /// Uppercase command name.
        command: String,
        /// Reply content.
        content: String,
    },
    /// Answer to one of our PING queries.
    PingReply {
        /// Replying nickname.
        sender: String,
        /// Time since the matching query was sent.
        elapsed: Duration,
    },
    /// ERRMSG reply.
    ErrorReply {
        /// Replying nickname.
        sender: String,
        /// Error text.
        content: String,
    },
}

/// What handling one CTCP message produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CtcpOutcome {
    /// Send `payload` back to `target` as a CTCP reply (a NOTICE).
    Reply {
        /// Nickname to answer.
        target: String,
        /// Inner reply text, delimiters not yet added.
        payload: String,
    },
    /// Report an event to the application.
    Event(CtcpEvent),
}

/// Result of the unknown-command hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookResult {
    /// The hook took care of the message; no default reply.
    Handled,
    /// Fall through to the default ERRMSG reply for queries.
    Unhandled,
}

/// Callback run for commands without a built-in handler.
pub type UnknownCtcpHook = Box<dyn Fn(&CtcpMessage) -> HookResult + Send + Sync>;

type Handler = fn(&CtcpEngine, &CtcpMessage, &mut Vec<CtcpOutcome>);

struct HandlerEntry {
    name: &'static str,
    description: &'static str,
    handler: Handler,
}

static HANDLERS: &[HandlerEntry] = &[
    HandlerEntry {
        name: "ACTION",
        description: "ACTION <text> - describes an action performed by the sender",
        handler: handle_action,
    },
    HandlerEntry {
        name: "CLIENTINFO",
        description: "CLIENTINFO [<command>] - lists supported commands or describes one",
        handler: handle_clientinfo,
    },
    HandlerEntry {
        name: "ERRMSG",
        description: "ERRMSG <text> - reports an error in reply to a query",
        handler: handle_errmsg,
    },
    HandlerEntry {
        name: "FINGER",
        description: "FINGER - returns information about the user",
        handler: handle_identity,
    },
    HandlerEntry {
        name: "PING",
        description: "PING <token> - echoes the token back to measure latency",
        handler: handle_ping,
    },
    HandlerEntry {
        name: "SOURCE",
        description: "SOURCE - returns where to obtain the client",
        handler: handle_identity,
    },
    HandlerEntry {
        name: "TIME",
        description: "TIME - returns the local time of the client",
        handler: handle_time,
    },
    HandlerEntry {
        name: "USERINFO",
        description: "USERINFO - returns a user-defined string",
        handler: handle_identity,
    },
    HandlerEntry {
        name: "VERSION",
        description: "VERSION - returns the client name and version",
        handler: handle_identity,
    },
];

fn handler_map() -> &'static HashMap<String, &'static HandlerEntry> {
    static MAP: OnceLock<HashMap<String, &'static HandlerEntry>> = OnceLock::new();
    MAP.get_or_init(|| {
        HANDLERS
            .iter()
            .map(|entry| (entry.name.to_ascii_lowercase(), entry))
            .collect()
    })
}

fn lookup(command: &str) -> Option<&'static HandlerEntry> {
    handler_map().get(&command.to_ascii_lowercase()).copied()
}

/// Names of all built-in commands, uppercase, in CLIENTINFO order.
pub fn known_commands() -> impl Iterator<Item = &'static str> {
    HANDLERS.iter().map(|entry| entry.name)
}

/// Answers CTCP queries and turns replies into events.
///
/// ```
/// use slirc_engine::ctcp::{ClientInfo, CtcpEngine, CtcpMessage, CtcpOutcome};
///
/// let engine = CtcpEngine::new(ClientInfo::default());
/// let msg = CtcpMessage::parse("PING 1234", true, None, "alice").unwrap();
/// assert_eq!(
///     engine.handle(&msg),
///     vec![CtcpOutcome::Reply { target: "alice".into(), payload: "PING 1234".into() }]
/// );
/// ```
pub struct CtcpEngine {
    info: ClientInfo,
    pings: PingTracker,
    unknown_hook: Option<UnknownCtcpHook>,
}

impl CtcpEngine {
    /// Create an engine answering with `info`.
    pub fn new(info: ClientInfo) -> Self {
        Self {
            info,
            pings: PingTracker::new(),
            unknown_hook: None,
        }
    }

    /// Install the callback run for unknown commands.
    #[must_use]
    pub fn with_unknown_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CtcpMessage) -> HookResult + Send + Sync + 'static,
    {
        self.unknown_hook = Some(Box::new(hook));
        self
    }

    /// Identity strings used for replies.
    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    /// Outstanding PING queries.
    pub fn pings(&self) -> &PingTracker {
        &self.pings
    }

    /// Build a PING query for `target` and record its send time.
    ///
    /// Returns the inner payload; the token is the current Unix time in
    /// milliseconds, echoed back by the peer but never interpreted.
    pub fn ping_query(&self, target: &str) -> String {
        self.pings.record(target);
        format!("PING {}", chrono::Utc::now().timestamp_millis())
    }

    /// Handle one received CTCP message.
    pub fn handle(&self, msg: &CtcpMessage) -> Vec<CtcpOutcome> {
        let mut out = Vec::new();
        match lookup(msg.command()) {
            Some(entry) => (entry.handler)(self, msg, &mut out),
            None => self.handle_unknown(msg, &mut out),
        }
        out
    }

    fn handle_unknown(&self, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
        let result = self
            .unknown_hook
            .as_ref()
            .map_or(HookResult::Unhandled, |hook| hook(msg));

        debug!(
            command = msg.command(),
            sender = msg.sender(),
            query = msg.is_query(),
            ?result,
            "unknown CTCP command"
        );

        if result == HookResult::Unhandled && msg.is_query() {
            reply(
                msg,
                format!(
                    "ERRMSG {} :Unknown CTCP command",
                    msg.command().to_ascii_uppercase()
                ),
                out,
            );
        }
    }
}

impl std::fmt::Debug for CtcpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtcpEngine")
            .field("info", &self.info)
            .field("pings", &self.pings)
            .field("unknown_hook", &self.unknown_hook.is_some())
            .finish()
    }
}

fn reply(msg: &CtcpMessage, payload: String, out: &mut Vec<CtcpOutcome>) {
    out.push(CtcpOutcome::Reply {
        target: msg.sender().to_owned(),
        payload,
    });
}

fn reply_event(msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    out.push(CtcpOutcome::Event(CtcpEvent::Reply {
        sender: msg.sender().to_owned(),
        command: msg.kind().as_str().to_ascii_uppercase(),
        content: msg.content().to_owned(),
    }));
}

fn with_content(command: &str, content: &str) -> String {
    if content.is_empty() {
        command.to_owned()
    } else {
        format!("{} {}", command, content)
    }
}

fn handle_action(_: &CtcpEngine, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    out.push(CtcpOutcome::Event(CtcpEvent::Action {
        channel: msg.channel().map(str::to_owned),
        sender: msg.sender().to_owned(),
        text: msg.content().to_owned(),
    }));
}

fn handle_identity(engine: &CtcpEngine, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    if !msg.is_query() {
        reply_event(msg, out);
        return;
    }

    let info = &engine.info;
    let (command, value) = match msg.kind() {
        CtcpKind::Version => ("VERSION", &info.version),
        CtcpKind::Finger => ("FINGER", &info.finger),
        CtcpKind::Userinfo => ("USERINFO", &info.userinfo),
        CtcpKind::Source => ("SOURCE", &info.source),
        _ => return,
    };
    reply(msg, with_content(command, value), out);
}

fn handle_time(_: &CtcpEngine, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    if !msg.is_query() {
        reply_event(msg, out);
        return;
    }
    let now = chrono::Local::now().to_rfc2822();
    reply(msg, with_content("TIME", &now), out);
}

fn handle_clientinfo(_: &CtcpEngine, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    if !msg.is_query() {
        reply_event(msg, out);
        return;
    }

    let answer = match msg.content().split_whitespace().next() {
        None => known_commands().collect::<Vec<_>>().join(","),
        Some(command) => match lookup(command) {
            Some(entry) => format!("{}: {}", entry.name, entry.description),
            None => "N/A".to_string(),
        },
    };
    reply(msg, with_content("CLIENTINFO", &answer), out);
}

fn handle_errmsg(_: &CtcpEngine, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    if msg.is_query() {
        trace!(sender = msg.sender(), "ignoring ERRMSG query");
        return;
    }
    out.push(CtcpOutcome::Event(CtcpEvent::ErrorReply {
        sender: msg.sender().to_owned(),
        content: msg.content().to_owned(),
    }));
}

fn handle_ping(engine: &CtcpEngine, msg: &CtcpMessage, out: &mut Vec<CtcpOutcome>) {
    if msg.is_query() {
        reply(msg, with_content("PING", msg.content()), out);
        return;
    }

    match engine.pings.complete(msg.sender()) {
        Some(elapsed) => out.push(CtcpOutcome::Event(CtcpEvent::PingReply {
            sender: msg.sender().to_owned(),
            elapsed,
        })),
        None => debug!(sender = msg.sender(), "PING reply without outstanding query"),
    }
}
