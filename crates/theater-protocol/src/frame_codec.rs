//! Theater frame encoding/decoding.
//!
//! Converts between raw frames (`&[u8]`) and an action code plus
//! [`Parameter`]s. See [`wire_types`](crate::wire_types) for the layout.
//!
//! Decoding is deliberately lenient:
//! - the length field is not checked against the buffer,
//! - the last byte is dropped as the terminator whatever its value,
//! - the body splits on single spaces, empty tokens and tokens without
//!   `=` are skipped, and a repeated key keeps its last value.
//!
//! NOTE: one buffer is one frame. The session does not reassemble frames
//! split across reads; [`frame_length`] exists for clients that read
//! replies off a stream.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use theater_core::Parameter;

use crate::wire_types::{ACTION_LEN, HEADER_SIZE, LENGTH_OFFSET, TERMINATOR};

/// Errors that can arise when decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer not longer than the header; nothing to dispatch.
    Truncated { len: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Truncated { len } => {
                write!(f, "Frame truncated: {} bytes, header is {}", len, HEADER_SIZE)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// One decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Four-character action code (lossy if not valid UTF-8).
    pub action: String,
    pub parameter: Parameter,
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a single frame from a buffer.
///
/// Buffers of [`HEADER_SIZE`] bytes or less are rejected.
pub fn decode(buf: &[u8]) -> Result<Frame, ProtocolError> {
    if buf.len() <= HEADER_SIZE {
        return Err(ProtocolError::Truncated { len: buf.len() });
    }

    let action = String::from_utf8_lossy(&buf[..ACTION_LEN]).into_owned();
    let body = String::from_utf8_lossy(&buf[HEADER_SIZE..buf.len() - 1]);

    Ok(Frame {
        action,
        parameter: decode_body(&body),
    })
}

/// Parse `KEY=VALUE KEY2="VALUE 2"`-style text into parameters.
///
/// Quotes are kept verbatim; a quoted value containing a space is split
/// like any other token.
pub fn decode_body(body: &str) -> Parameter {
    body.split(' ')
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.split_once('='))
        .collect()
}

/// Total frame length announced in a header, if `header` is long enough.
pub fn frame_length(header: &[u8]) -> Option<usize> {
    let field: [u8; 4] = header
        .get(LENGTH_OFFSET..LENGTH_OFFSET + 4)?
        .try_into()
        .ok()?;
    Some(u32::from_be_bytes(field) as usize)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a frame whose body is `parameter` in ascending key order.
pub fn encode(action: &str, parameter: &Parameter) -> Bytes {
    encode_raw(action, &encode_body(parameter))
}

/// Encode a frame around an already serialized body.
pub fn encode_raw(action: &str, body: &str) -> Bytes {
    let total_len = HEADER_SIZE + body.len() + 1;
    let mut out = BytesMut::with_capacity(total_len);

    // action, zero-padded if short
    let mut code = [0u8; ACTION_LEN];
    for (dst, src) in code.iter_mut().zip(action.bytes()) {
        *dst = src;
    }
    out.put_slice(&code);

    out.put_bytes(0, LENGTH_OFFSET - ACTION_LEN); // reserved
    out.put_u32(total_len as u32);

    out.put_slice(body.as_bytes());
    out.put_u8(TERMINATOR);

    out.freeze()
}

/// Join pairs as `KEY=VALUE` with single spaces, no trailing separator.
pub fn encode_body(parameter: &Parameter) -> String {
    parameter
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Render a frame for logs: printable ASCII and tab kept, the rest as `.`.
pub fn to_printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if (32..=126).contains(&b) || b == b'\t' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}
