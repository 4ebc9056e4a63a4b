//! Error types for the IRC client engine.
//!
//! This module defines error types for line framing, IRC line parsing
//! and CTCP encoding. Transport-level failures live in
//! [`crate::transport::TransportError`].

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while framing or encoding protocol lines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A received line grew past the configured limit before its terminator arrived.
    #[error("line too long: {actual} bytes (limit {limit})")]
    LineTooLong {
        /// Number of bytes buffered.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// The configured text encoding label is not known.
    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// An outgoing line contained `\r` or `\n`.
    #[error("outgoing line contains an embedded line terminator")]
    EmbeddedTerminator,

    /// Failed to parse an IRC line.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The raw line.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC lines.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Parsing failed with context information.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Character position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}

/// Errors raised by the CTCP layer for caller contract violations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CtcpError {
    /// Attempted to encode or parse an empty CTCP payload.
    #[error("CTCP payload must not be empty")]
    EmptyPayload,

    /// The payload contained the `\x01` delimiter.
    #[error("CTCP payload must not contain the \\x01 delimiter")]
    EmbeddedDelimiter,

    /// A CTCP message was built without an originating user.
    #[error("CTCP message requires a sender")]
    MissingSender,
}
