//! Transport error types.

use std::time::Duration;

use thiserror::Error;

use crate::error::ProtocolError;

/// Errors that can occur on a [`super::Connection`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// An I/O error occurred, including TLS handshake failures.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A framing or encoding error occurred.
    #[error("transport protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The connection attempt did not finish in time.
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The TLS client configuration could not be built.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// The host is not usable as a TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// A line was sent while no connection was established.
    #[error("not connected")]
    NotConnected,

    /// The connection was closed locally while the operation was pending.
    #[error("connection closed")]
    Closed,
}

/// How the connection reacts to an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Tear the connection down and emit one `Closed` event.
    Fault,
    /// Stop quietly; the connection was closed on purpose.
    Silent,
    /// Tear down and hand the error to the caller.
    Fatal,
}

impl TransportError {
    /// Classify this error.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Io(_) | Self::Timeout(_) => Disposition::Fault,
            Self::Protocol(ProtocolError::Io(_))
            | Self::Protocol(ProtocolError::LineTooLong { .. }) => Disposition::Fault,
            Self::Closed => Disposition::Silent,
            _ => Disposition::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let transport_err: TransportError = io_err.into();

        assert!(matches!(transport_err, TransportError::Io(_)));
        assert_eq!(
            transport_err.to_string(),
            "transport I/O error: connection refused"
        );
    }

    #[test]
    fn test_dispositions() {
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert_eq!(
            TransportError::from(reset).disposition(),
            Disposition::Fault
        );
        assert_eq!(
            TransportError::from(ProtocolError::LineTooLong {
                actual: 10,
                limit: 5
            })
            .disposition(),
            Disposition::Fault
        );
        assert_eq!(TransportError::Closed.disposition(), Disposition::Silent);
        assert_eq!(
            TransportError::from(ProtocolError::EmbeddedTerminator).disposition(),
            Disposition::Fatal
        );
        assert_eq!(
            TransportError::NotConnected.disposition(),
            Disposition::Fatal
        );
    }

    #[test]
    fn test_error_source_chaining() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let transport_err: TransportError = io_err.into();

        let source = std::error::Error::source(&transport_err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), "broken pipe");
    }
}
