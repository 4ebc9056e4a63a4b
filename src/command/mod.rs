//! Outbound slash-command dispatch.
//!
//! Text typed by the user is either a plain message for the active
//! conversation or, when it starts with the command indicator, a command
//! such as `/join #rust` or `/msg alice hi`. [`Dispatcher`] resolves the
//! command's channel, user and text arguments against the processor's
//! declared [`Signature`] and returns the [`Outbound`] actions to perform.
//! Commands without a processor are passed to the server verbatim.
//!
//! ```
//! use slirc_engine::command::{DispatchConfig, Dispatcher, Outbound};
//!
//! let dispatcher = Dispatcher::new(DispatchConfig::default());
//! assert_eq!(
//!     dispatcher.dispatch("/msg alice hi", Some("#rust")),
//!     vec![Outbound::Message { target: "alice".into(), text: "hi".into(), echo: false }]
//! );
//! assert_eq!(
//!     dispatcher.dispatch("/whowas bob 3", None),
//!     vec![Outbound::Raw("whowas bob 3".into())]
//! );
//! ```

mod resolve;
mod table;

use tracing::debug;

use crate::chan::DEFAULT_CHANNEL_TYPES;

/// Dispatcher settings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Character that marks a line as a command.
    pub indicator: char,
    /// Channel prefixes of the network (`CHANTYPES`).
    pub channel_types: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            indicator: '/',
            channel_types: DEFAULT_CHANNEL_TYPES.to_string(),
        }
    }
}

/// Whether a processor needs, accepts or refuses an argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    /// Must be present or the invocation is dropped.
    Required,
    /// May be present.
    Optional,
    /// Must be absent; a channel-shaped first token is then treated as text.
    Rejected,
}

/// Declared arguments of a command processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Channel argument.
    pub channel: Param,
    /// User argument.
    pub user: Param,
    /// Trailing free text.
    pub text: Param,
    /// Use the active conversation as the channel when none was given.
    /// Only applies to a required channel and a channel-shaped active name.
    pub active_fallback: bool,
}

impl Signature {
    /// A signature without active-channel fallback.
    pub const fn new(channel: Param, user: Param, text: Param) -> Self {
        Self {
            channel,
            user,
            text,
            active_fallback: false,
        }
    }

    /// Enable the active-channel fallback.
    #[must_use]
    pub const fn with_active_fallback(mut self) -> Self {
        self.active_fallback = true;
        self
    }
}

/// A resolved command, ready for its processor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Canonical lower-case command name, aliases expanded.
    pub command: String,
    /// Resolved channel.
    pub channel: Option<String>,
    /// Resolved user.
    pub user: Option<String>,
    /// Remaining text, trimmed; may be empty.
    pub text: String,
}

/// An action produced by dispatching user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// PRIVMSG; `echo` asks the caller to show the sent text locally.
    Message {
        /// Channel or nickname.
        target: String,
        /// Message text.
        text: String,
        /// Show a sent-message notification.
        echo: bool,
    },
    /// NOTICE.
    Notice {
        /// Channel or nickname.
        target: String,
        /// Notice text.
        text: String,
    },
    /// CTCP ACTION (`/me`).
    Action {
        /// Channel or nickname.
        target: String,
        /// Action text.
        text: String,
    },
    /// CTCP query.
    CtcpQuery {
        /// Channel or nickname.
        target: String,
        /// Uppercase CTCP command.
        command: String,
        /// Query content; may be empty.
        content: String,
    },
    /// A protocol line sent as is.
    Raw(String),
}

/// Turns user input into outbound actions.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Dispatcher settings.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch one line of user input.
    ///
    /// `active` is the name of the focused conversation, if any. Invalid
    /// invocations produce no actions.
    pub fn dispatch(&self, input: &str, active: Option<&str>) -> Vec<Outbound> {
        let Some(body) = input.strip_prefix(self.config.indicator) else {
            return plain_message(input, active);
        };
        if body.starts_with(self.config.indicator) {
            return plain_message(body, active);
        }

        let (name, args) = body.split_once(' ').unwrap_or((body, ""));
        if name.is_empty() {
            return Vec::new();
        }

        let (command, args) = table::canonical(name, args);
        let Some(processor) = table::lookup(&command) else {
            return vec![Outbound::Raw(raw_line(name, args))];
        };

        match resolve::resolve(
            processor.signature,
            command,
            args,
            active,
            &self.config.channel_types,
        ) {
            Some(invocation) => (processor.process)(&invocation, active),
            None => Vec::new(),
        }
    }

    /// Resolve a command line without running it.
    ///
    /// Returns `None` for plain text, unknown commands and invocations that
    /// do not satisfy the processor's signature.
    pub fn resolve(&self, input: &str, active: Option<&str>) -> Option<CommandInvocation> {
        let body = input.strip_prefix(self.config.indicator)?;
        if body.starts_with(self.config.indicator) {
            return None;
        }
        let (name, args) = body.split_once(' ').unwrap_or((body, ""));
        let (command, args) = table::canonical(name, args);
        let processor = table::lookup(&command)?;
        resolve::resolve(
            processor.signature,
            command,
            args,
            active,
            &self.config.channel_types,
        )
    }

    /// Whether `name` has a processor, after alias expansion.
    pub fn is_known(&self, name: &str) -> bool {
        let (command, _) = table::canonical(name, "");
        table::lookup(&command).is_some()
    }
}

fn plain_message(text: &str, active: Option<&str>) -> Vec<Outbound> {
    if text.is_empty() {
        return Vec::new();
    }
    match active {
        Some(target) => vec![Outbound::Message {
            target: target.to_owned(),
            text: text.to_owned(),
            echo: true,
        }],
        None => {
            debug!("no active conversation, dropping message");
            Vec::new()
        }
    }
}

fn raw_line(name: &str, rest: &str) -> String {
    if rest.is_empty() {
        name.to_owned()
    } else {
        format!("{} {}", name, rest)
    }
}
