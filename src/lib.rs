//! # slirc-engine
//!
//! The client side of an IRC connection, below the user interface.
//!
//! ## Features
//!
//! - Line transport over TCP or TLS with configurable text encoding
//! - CTCP envelope handling, automatic replies and ping timing
//! - mIRC formatting parsed into styled runs of words and punctuation
//! - Slash-command dispatch with channel and user resolution
//! - A sans-IO [`Session`] that ties the layers together

#![deny(clippy::all)]
// TODO: Enable once documentation coverage is complete
// #![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing formatted text
//!
//! ```rust
//! use slirc_engine::format::{self, IrcColor};
//!
//! let runs: Vec<_> = format::parse("\x0304Hello\x0F World").collect();
//! assert_eq!(runs.len(), 2);
//! assert_eq!(runs[0].foreground, IrcColor::Red);
//! assert_eq!(runs[1].text(), " World");
//! ```
//!
//! ### Handling received lines
//!
//! ```rust
//! use slirc_engine::{Session, SessionConfig};
//!
//! let session = Session::new(SessionConfig::default());
//! let reaction = session.receive(":bob!b@host PRIVMSG slirc :\x01TIME\x01").unwrap();
//! assert!(reaction.lines[0].starts_with("NOTICE bob :\x01TIME "));
//! ```

pub mod casemap;
pub mod chan;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod format;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod session;
#[cfg(feature = "tokio")]
pub mod transport;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::chan::ChannelExt;
pub use self::command::{Dispatcher, Outbound};
pub use self::ctcp::{Ctcp, CtcpEngine, CtcpKind, CtcpMessage};
pub use self::error::{CtcpError, MessageParseError, ProtocolError};
pub use self::format::FormattedStringExt;
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::Line;
pub use self::session::{Reaction, Session, SessionConfig, SessionEvent};
#[cfg(feature = "tokio")]
pub use self::transport::{Connection, ConnectionConfig, ConnectionEvent, TransportError};
