//! TCP listener and live-session registry.
//!
//! A `Listener<S>`:
//! - binds the port configured for its protocol,
//! - accepts connections and wraps each one in a session `S`,
//! - registers the session, then spawns its read loop (never joined),
//! - removes the session again once the read loop returns.
//!
//! The live-session list sits behind a single mutex. [`Listener::snapshot`]
//! hands out a copy so the reaper and status reporting never hold it.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::SettingsStore;
use crate::connection::Connection;
use crate::error::ServerError;
use crate::session::Session;
use crate::types::{BoxedReader, Transport};

const BACKLOG: u32 = 128;

pub struct Listener<S: Session> {
    socket: TcpListener,
    local_addr: SocketAddr,
    sessions: Mutex<Vec<Arc<S>>>,
    context: Arc<S::Context>,
    settings: Arc<SettingsStore>,
}

impl<S: Session> Listener<S> {
    /// Bind `addr` with address reuse enabled.
    pub async fn bind(
        addr: SocketAddr,
        context: Arc<S::Context>,
        settings: Arc<SettingsStore>,
    ) -> Result<Arc<Self>, ServerError> {
        let socket = bind_socket(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = socket.local_addr()?;

        info!(server = S::NAME, "Server is now listening on {} tcp", local_addr);

        Ok(Arc::new(Listener {
            socket,
            local_addr,
            sessions: Mutex::new(Vec::new()),
            context,
            settings,
        }))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn context(&self) -> &Arc<S::Context> {
        &self.context
    }

    /// Accept loop. Only returns if `accept` itself fails.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = self.socket.accept().await?;
            let _ = stream.set_nodelay(true);

            let (reader, writer) = stream.into_split();
            self.attach(peer, Box::new(reader), writer).await;
        }
    }

    /// Register a session for an already accepted transport and spawn
    /// its read loop.
    pub async fn attach<W>(self: &Arc<Self>, peer: SocketAddr, reader: BoxedReader, writer: W) -> Arc<S>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let connection = Connection::new(peer, writer);
        let session = Arc::new(S::new(connection, Arc::clone(&self.context)));

        self.sessions.lock().await.push(Arc::clone(&session));
        self.on_client_connect(session.connection());

        let listener = Arc::clone(self);
        let running = Arc::clone(&session);
        tokio::spawn(async move {
            Arc::clone(&running).run(reader).await;
            listener.disconnect(&running).await;
        });

        session
    }

    /// Point-in-time copy of the live sessions.
    pub async fn snapshot(&self) -> Vec<Arc<S>> {
        self.sessions.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Drop `session` from the live list.
    ///
    /// Stream sessions are matched by identity; datagram listeners keep
    /// no per-peer entry worth searching, so they only log.
    pub async fn disconnect(&self, session: &Arc<S>) {
        match S::TRANSPORT {
            Transport::Stream => {
                let removed = {
                    let mut sessions = self.sessions.lock().await;
                    match sessions.iter().position(|s| Arc::ptr_eq(s, session)) {
                        Some(pos) => {
                            sessions.remove(pos);
                            true
                        }
                        None => false,
                    }
                };

                if removed {
                    self.on_client_disconnect(session.connection());
                }
            }
            Transport::Datagram => self.on_client_disconnect(session.connection()),
        }
    }

    /// Close every live session. Each read loop then unwinds and
    /// removes itself.
    pub async fn disconnect_all(&self) {
        for session in self.snapshot().await {
            session.connection().close().await;
        }
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    fn on_client_connect(&self, connection: &Connection) {
        if self.settings.read().show_client_connect {
            info!(server = S::NAME, "Client {} connected", connection.address());
        } else {
            debug!(server = S::NAME, "Client {} connected", connection.address());
        }
    }

    fn on_client_disconnect(&self, connection: &Connection) {
        if self.settings.read().show_client_disconnect {
            info!(server = S::NAME, "Client {} disconnected", connection.address());
        } else {
            debug!(server = S::NAME, "Client {} disconnected", connection.address());
        }
    }
}

fn bind_socket(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    socket.set_reuseaddr(true)?;
    #[cfg(unix)]
    socket.set_reuseport(true)?;

    socket.bind(addr)?;
    socket.listen(BACKLOG)
}
