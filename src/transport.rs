//! IRC line transport for async I/O.
//!
//! This module owns the byte stream to the server. [`Connection`] connects
//! over plain TCP or client-side TLS, frames the incoming bytes into lines
//! with [`LineCodec`](crate::line::LineCodec), and reports each line and the
//! end of the connection as a [`ConnectionEvent`].
//!
//! # Failure handling
//!
//! Every error is classified by [`TransportError::disposition`]:
//!
//! - I/O, TLS, timeout, end-of-stream and oversized lines are faults: the
//!   connection is torn down and one [`ConnectionEvent::Closed`] is sent.
//! - A local [`Connection::close`] stops the read loop silently.
//! - Anything else is handed back to the caller.

mod connection;
mod error;
mod tls;

pub use connection::Connection;
pub use error::{Disposition, TransportError};

use crate::line::DEFAULT_MAX_LINE_LEN;

/// Size of the buffer reused for each socket read.
pub const READ_BUFFER_SIZE: usize = 32 * 1024;

/// Default plain-text IRC port.
pub const DEFAULT_PORT: u16 = 6667;

/// Default TLS IRC port.
pub const DEFAULT_TLS_PORT: u16 = 6697;

/// Notifications produced by a [`Connection`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A complete line arrived, terminator stripped.
    Line(String),
    /// The connection attempt ended. Sent at most once per attempt.
    Closed,
}

/// Endpoint parameters, fixed for the lifetime of a [`Connection`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Wrap the stream in TLS.
    pub use_tls: bool,
    /// Skip certificate validation. Only meaningful with `use_tls`.
    pub accept_invalid_certs: bool,
    /// WHATWG label of the text encoding used on the wire.
    pub encoding: String,
    /// Longest line accepted from the server, in bytes.
    pub max_line_len: usize,
}

impl ConnectionConfig {
    /// Plain-text connection to `host:port` with UTF-8 encoding.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Enable or disable TLS.
    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Accept certificates that fail validation.
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Use a different text encoding.
    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            use_tls: false,
            accept_invalid_certs: false,
            encoding: "utf-8".to_string(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}
