//! Idle-session reaper.
//!
//! One reaper per listener. Every `interval` it closes each session whose
//! last successful read is at least `interval` old; closing wakes the
//! session read loop, which then unwinds and unregisters itself.
//!
//! A session that goes quiet right after a sweep survives the next one,
//! so eviction takes between one and two intervals.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::listener::Listener;
use crate::session::Session;

/// `true` if `last_activity` is at or before `now - idle_after`.
pub fn is_idle(last_activity: Instant, now: Instant, idle_after: Duration) -> bool {
    match now.checked_sub(idle_after) {
        Some(threshold) => last_activity <= threshold,
        None => false,
    }
}

/// Run forever, sweeping `listener` every `interval`.
pub async fn run<S: Session>(listener: Arc<Listener<S>>, interval: Duration) {
    info!(server = S::NAME, "Heartbeat started");

    loop {
        sleep(interval).await;
        sweep(&listener, interval).await;
    }
}

/// Close every session idle for at least `idle_after`. Returns how many
/// were closed. A session stalled mid-send does not hold up the sweep.
pub async fn sweep<S: Session>(listener: &Listener<S>, idle_after: Duration) -> usize {
    let now = Instant::now();
    let mut closed = 0;

    for session in listener.snapshot().await {
        let connection = session.connection();

        if is_idle(connection.last_activity(), now, idle_after) {
            debug!(server = S::NAME, "Closing idle client {}", connection.address());
            connection.close().await;
            closed += 1;
        }
    }

    closed
}
