//! Line-based codec for tokio.
//!
//! This module provides a codec that splits a byte stream into
//! newline-terminated protocol lines and decodes them with the
//! connection's text encoding. A line that has not seen its terminator
//! yet stays in the read buffer until the next read completes it, so the
//! emitted lines do not depend on how the peer's bytes were chunked.

use std::borrow::Cow;

use bytes::BytesMut;
use encoding::Encoding;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};

/// Default maximum length of one received line, terminator excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 32 * 1024;

/// Line terminator appended to every outgoing line.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Line-based codec that handles newline-terminated messages.
///
/// Incoming lines may end in `\n` or `\r\n`; the terminator is stripped.
/// Outgoing lines get [`LINE_TERMINATOR`] appended.
#[derive(Clone, Debug)]
pub struct LineCodec {
    encoding: &'static Encoding,
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
}

impl LineCodec {
    /// Create a new codec with the specified encoding.
    ///
    /// # Arguments
    /// * `label` - WHATWG encoding label (e.g., "utf-8", "iso-8859-1")
    pub fn new(label: &str) -> error::Result<Self> {
        Self::with_max_len(label, DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(label: &str, max_len: usize) -> error::Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ProtocolError::UnknownEncoding(label.to_owned()))?;
        Ok(Self {
            encoding,
            next_index: 0,
            max_len,
        })
    }

    /// Canonical name of the codec's encoding.
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Maximum accepted line length in bytes.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            let mut end = line.len() - 1;
            if end > 0 && line[end - 1] == b'\r' {
                end -= 1;
            }

            if end > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: end,
                    limit: self.max_len,
                });
            }

            let (text, _had_errors) = self.encoding.decode_without_bom_handling(&line[..end]);
            Ok(Some(text.into_owned()))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            // A full-length line may be waiting on its `\n` after the `\r`.
            let limit = self.max_len + usize::from(src.last() == Some(&b'\r'));
            if src.len() > limit {
                return Err(ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        if line.contains(['\r', '\n']) {
            return Err(ProtocolError::EmbeddedTerminator);
        }

        let (bytes, _enc, _had_errors) = self.encoding.encode(&line);
        dst.reserve(bytes.len() + LINE_TERMINATOR.len());
        match bytes {
            Cow::Borrowed(b) => dst.extend_from_slice(b),
            Cow::Owned(v) => dst.extend_from_slice(&v),
        }
        dst.extend_from_slice(LINE_TERMINATOR.as_bytes());

        Ok(())
    }
}
