//! # Gitway Protocol
//!
//! Git pkt-line framing for the smart HTTP transport.
//!
//! The smart protocol frames every line as a 4-digit lowercase hex length
//! prefix followed by the payload, where the advertised length includes the
//! prefix itself. The special frame `0000` (a flush packet) carries no
//! payload and marks a section boundary.
//!
//! The gateway only ever emits the service-announcement frame for
//! protocol-v0 clients, but the codec is symmetric: [`Decoder`] walks a byte
//! buffer frame by frame.

use thiserror::Error;

/// The flush packet, a fixed 4-byte frame with no payload.
pub const FLUSH_PKT: &[u8] = b"0000";

/// Length of the hex prefix on every frame.
const PREFIX_LEN: usize = 4;

/// Largest payload a single pkt-line frame can carry (`0xffff - 4`).
pub const MAX_PAYLOAD_LEN: usize = 0xffff - PREFIX_LEN;

/// Encodes one payload as a pkt-line frame.
///
/// The prefix is `len(payload) + 4` as 4 lowercase hex digits, left-padded
/// with zeros.
///
/// # Panics
///
/// Panics if the payload exceeds [`MAX_PAYLOAD_LEN`]; frames that large are a
/// caller bug, not a runtime condition.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= MAX_PAYLOAD_LEN,
        "pkt-line payload of {} bytes exceeds the frame limit",
        payload.len()
    );

    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(format!("{:04x}", payload.len() + PREFIX_LEN).as_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Returns the flush packet.
pub fn flush() -> &'static [u8] {
    FLUSH_PKT
}

/// A single decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    /// A data frame and its payload (possibly empty for `0004`).
    Data(&'a [u8]),
    /// The `0000` flush packet.
    Flush,
}

/// Errors produced while decoding a pkt-line buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer than 4 bytes remained where a length prefix was expected.
    #[error("truncated pkt-line length prefix")]
    TruncatedPrefix,

    /// The length prefix was not 4 lowercase hex digits.
    #[error("invalid pkt-line length prefix {0:?}")]
    InvalidPrefix(String),

    /// The advertised length is smaller than the prefix it includes.
    #[error("pkt-line length {0} is shorter than its own prefix")]
    LengthUnderflow(usize),

    /// The buffer ended before the advertised payload length.
    #[error("truncated pkt-line payload: expected {expected} bytes, found {found}")]
    TruncatedPayload { expected: usize, found: usize },
}

/// Iterator over the pkt-line frames of a byte buffer.
///
/// Yields [`Packet`]s until the buffer is exhausted; a malformed frame ends
/// iteration with a [`DecodeError`].
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over a complete buffer of frames.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn next_frame(&mut self) -> Result<Packet<'a>, DecodeError> {
        let rest = &self.buf[self.pos..];
        if rest.len() < PREFIX_LEN {
            return Err(DecodeError::TruncatedPrefix);
        }

        let prefix = &rest[..PREFIX_LEN];
        let len = parse_prefix(prefix)?;

        if len == 0 {
            self.pos += PREFIX_LEN;
            return Ok(Packet::Flush);
        }
        if len < PREFIX_LEN {
            return Err(DecodeError::LengthUnderflow(len));
        }
        if rest.len() < len {
            return Err(DecodeError::TruncatedPayload {
                expected: len - PREFIX_LEN,
                found: rest.len() - PREFIX_LEN,
            });
        }

        let payload = &rest[PREFIX_LEN..len];
        self.pos += len;
        Ok(Packet::Data(payload))
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<Packet<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let frame = self.next_frame();
        if frame.is_err() {
            self.failed = true;
        }
        Some(frame)
    }
}

fn parse_prefix(prefix: &[u8]) -> Result<usize, DecodeError> {
    let mut len = 0usize;
    for &b in prefix {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            _ => {
                return Err(DecodeError::InvalidPrefix(
                    String::from_utf8_lossy(prefix).into_owned(),
                ));
            }
        };
        len = len * 16 + digit as usize;
    }
    Ok(len)
}
