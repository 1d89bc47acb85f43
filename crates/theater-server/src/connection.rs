//! One accepted transport endpoint.
//!
//! A `Connection` owns the write half of a socket plus the bookkeeping
//! the reaper needs:
//! - the send path is serialized by its own mutex, so replies never
//!   interleave,
//! - closing publishes a flag before touching the writer; the flag wakes
//!   the session read loop and aborts a send stalled on a full socket,
//! - last activity is refreshed after every successful read.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::time::Instant;
use tracing::debug;

use crate::types::BoxedWriter;

#[derive(Debug, Clone, Copy)]
struct Activity {
    /// Monotonic, compared by the reaper.
    at: Instant,
    /// Wall clock, reported in status snapshots.
    wall: DateTime<Utc>,
}

impl Activity {
    fn now() -> Self {
        Activity {
            at: Instant::now(),
            wall: Utc::now(),
        }
    }
}

pub struct Connection {
    peer: SocketAddr,

    /// `None` once closed.
    writer: AsyncMutex<Option<BoxedWriter>>,

    activity: Mutex<Activity>,

    closed: watch::Sender<bool>,
}

impl Connection {
    pub fn new<W>(peer: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (closed, _) = watch::channel(false);

        Connection {
            peer,
            writer: AsyncMutex::new(Some(Box::new(writer))),
            activity: Mutex::new(Activity::now()),
            closed,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn ip(&self) -> IpAddr {
        self.peer.ip()
    }

    pub fn port(&self) -> u16 {
        self.peer.port()
    }

    /// `ip:port`, the key that owns this peer's matches.
    pub fn address(&self) -> String {
        self.peer.to_string()
    }

    /// Hand `bytes` to the transport in a single write call.
    ///
    /// Fire-and-forget: failures and short writes are logged, not
    /// returned, and nothing is retried. A send still waiting on the
    /// transport when the connection closes is dropped.
    pub async fn send(&self, bytes: &[u8]) {
        let mut guard = tokio::select! {
            biased;
            _ = self.closed() => {
                debug!(peer = %self.peer, "send on closed connection dropped");
                return;
            }
            guard = self.writer.lock() => guard,
        };

        let Some(writer) = guard.as_mut() else {
            debug!(peer = %self.peer, "send on closed connection dropped");
            return;
        };

        let written = tokio::select! {
            biased;
            _ = self.closed() => {
                debug!(peer = %self.peer, len = bytes.len(), "send aborted by close");
                return;
            }
            written = async {
                let n = writer.write(bytes).await?;
                if n == bytes.len() {
                    writer.flush().await?;
                }
                Ok::<_, std::io::Error>(n)
            } => written,
        };

        match written {
            Ok(n) if n < bytes.len() => {
                debug!(peer = %self.peer, written = n, len = bytes.len(), "short write");
            }
            Ok(_) => {}
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "write failed");
            }
        }
    }

    /// Mark the connection closed, then shut the write side down.
    /// Idempotent.
    pub async fn close(&self) {
        self.closed.send_replace(true);

        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            let _ = writer.shutdown().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn update_last_activity(&self) {
        *self.activity() = Activity::now();
    }

    pub fn last_activity(&self) -> Instant {
        self.activity().at
    }

    pub fn last_activity_wall(&self) -> DateTime<Utc> {
        self.activity().wall
    }

    fn activity(&self) -> std::sync::MutexGuard<'_, Activity> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn peer() -> SocketAddr {
        "1.2.3.4:5555".parse().unwrap()
    }

    #[tokio::test]
    async fn send_reaches_peer() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let connection = Connection::new(peer(), ours);

        connection.send(b"hello").await;

        let mut buf = [0u8; 5];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(connection.address(), "1.2.3.4:5555");
    }

    #[tokio::test]
    async fn close_is_idempotent_and_ends_the_stream() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let connection = Connection::new(peer(), ours);

        connection.close().await;
        connection.close().await;
        assert!(connection.is_closed());

        // Sends after close are dropped silently.
        connection.send(b"late").await;

        let mut buf = Vec::new();
        theirs.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn closed_resolves_after_close() {
        let (ours, _theirs) = tokio::io::duplex(64);
        let connection = std::sync::Arc::new(Connection::new(peer(), ours));

        let waiter = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.closed().await })
        };

        connection.close().await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("closed() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn close_is_not_held_up_by_a_stalled_send() {
        let (ours, mut theirs) = tokio::io::duplex(8);
        let connection = std::sync::Arc::new(Connection::new(peer(), ours));

        // Fills the pipe; nobody reads, so the next send cannot finish.
        connection.send(b"12345678").await;
        let stalled = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.send(b"more").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!stalled.is_finished());

        tokio::time::timeout(Duration::from_secs(1), connection.close())
            .await
            .expect("close should not wait for the stalled send");
        tokio::time::timeout(Duration::from_secs(1), stalled)
            .await
            .expect("stalled send should be dropped")
            .unwrap();

        let mut buf = Vec::new();
        theirs.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"12345678");
    }

    #[tokio::test(start_paused = true)]
    async fn activity_moves_forward() {
        let (ours, _theirs) = tokio::io::duplex(64);
        let connection = Connection::new(peer(), ours);
        let first = connection.last_activity();

        tokio::time::advance(Duration::from_secs(5)).await;
        connection.update_last_activity();

        assert_eq!(connection.last_activity() - first, Duration::from_secs(5));
    }
}
