//! Theater protocol session.
//!
//! Each read is treated as exactly one frame: there is no reassembly of
//! frames split across TCP segments, and nothing is buffered between
//! reads. A read is decoded, dispatched, and every reply frame is sent
//! before the next read starts.
//!
//! When the loop ends for any reason the session's matches are removed
//! and the connection is closed.

pub mod handlers;

use std::sync::Arc;

use theater_core::MatchRegistry;
use theater_protocol::{decode, encode, to_printable};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::config::SettingsStore;
use crate::connection::Connection;
use crate::file_cache::FileCache;
use crate::session::Session;
use crate::types::{BoxedReader, Direction, Transport};

use self::handlers::{Dispatcher, Flow, RequestContext};

/// Bytes requested per read; also the largest frame a session accepts.
pub const READ_CHUNK: usize = 4096;

/// State shared by every theater session.
#[derive(Debug)]
pub struct TheaterContext {
    pub matchmaker: Arc<MatchRegistry>,
    pub settings: Arc<SettingsStore>,
    pub files: Arc<FileCache>,
    pub dispatcher: Dispatcher,
}

impl TheaterContext {
    pub fn new(
        matchmaker: Arc<MatchRegistry>,
        settings: Arc<SettingsStore>,
        files: Arc<FileCache>,
    ) -> Self {
        TheaterContext {
            matchmaker,
            settings,
            files,
            dispatcher: Dispatcher::theater(),
        }
    }
}

pub struct TheaterSession {
    connection: Connection,
    context: Arc<TheaterContext>,
}

impl Session for TheaterSession {
    const NAME: &'static str = "theater";
    const TRANSPORT: Transport = Transport::Stream;
    type Context = TheaterContext;

    fn new(connection: Connection, context: Arc<TheaterContext>) -> Self {
        TheaterSession {
            connection,
            context,
        }
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn run(self: Arc<Self>, mut reader: BoxedReader) {
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            let n = tokio::select! {
                read = reader.read(&mut buf) => match read {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        debug!(server = Self::NAME, "Read from {} failed: {}", self.connection.address(), e);
                        break;
                    }
                },
                _ = self.connection.closed() => break,
            };

            self.connection.update_last_activity();

            if self.on_frame(&buf[..n]).await == Flow::Disconnect {
                break;
            }
        }

        self.context.matchmaker.remove(&self.connection.address());
        self.connection.close().await;
    }
}

impl TheaterSession {
    /// Decode one read, dispatch it, and send the reply frames.
    async fn on_frame(&self, bytes: &[u8]) -> Flow {
        self.log_traffic(Direction::Inbound, bytes);

        let frame = match decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(server = Self::NAME, "Dropping frame from {}: {}", self.connection.address(), e);
                return Flow::Continue;
            }
        };

        let Some(handler) = self.context.dispatcher.get(&frame.action) else {
            warn!(
                server = Self::NAME,
                "Unknown action {:?} from {}",
                frame.action,
                self.connection.address()
            );
            return Flow::Continue;
        };

        let reply = handler(&RequestContext {
            peer: self.connection.peer(),
            context: &self.context,
            parameter: &frame.parameter,
        });

        for (action, parameter) in &reply.frames {
            let out = encode(action, parameter);
            self.log_traffic(Direction::Outbound, &out);
            self.connection.send(&out).await;
        }

        reply.flow
    }

    fn log_traffic(&self, direction: Direction, bytes: &[u8]) {
        let verbose = {
            let settings = self.context.settings.read();
            match direction {
                Direction::Inbound => settings.theater.show_requests,
                Direction::Outbound => settings.theater.show_responses,
            }
        };

        let address = self.connection.address();
        if verbose {
            info!(server = Self::NAME, "{} {} {}", address, direction, to_printable(bytes));
        } else {
            debug!(server = Self::NAME, "{} {} {}", address, direction, to_printable(bytes));
        }
    }
}
