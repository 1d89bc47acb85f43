//! Protocol session abstraction.
//!
//! Each protocol flavor implements [`Session`] and gets its own
//! strongly typed [`Listener`](crate::listener::Listener); the listener
//! never needs to know which concrete protocol it is serving.

use std::future::Future;
use std::sync::Arc;

use crate::connection::Connection;
use crate::types::{BoxedReader, Transport};

pub trait Session: Send + Sync + Sized + 'static {
    /// Subsystem name used in logs (e.g. `"theater"`).
    const NAME: &'static str;

    const TRANSPORT: Transport;

    /// Shared state handed to every session of this flavor.
    type Context: Send + Sync + 'static;

    fn new(connection: Connection, context: Arc<Self::Context>) -> Self;

    fn connection(&self) -> &Connection;

    /// Drive the read loop until the peer leaves, the connection is
    /// closed from elsewhere, or a handler ends the session.
    ///
    /// Must leave the connection closed when it returns.
    fn run(self: Arc<Self>, reader: BoxedReader) -> impl Future<Output = ()> + Send;
}
