//! Shared types for the theater TCP server.
//!
//! This module defines:
//! - boxed transport halves handed to sessions
//! - `Transport`: stream vs datagram flavor of a listener
//! - `Direction`: which way a logged frame travelled

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};

/// Read half of an accepted transport, owned by the session read loop.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write half of an accepted transport, owned by its `Connection`.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Transport flavor of a protocol listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Connection-oriented; sessions are tracked individually.
    Stream,
    /// Connectionless; disconnects are only logged.
    Datagram,
}

/// Direction of a logged frame, rendered `-->` (inbound) / `<--` (outbound).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("-->"),
            Direction::Outbound => f.write_str("<--"),
        }
    }
}
