//! Top-level server wiring.
//!
//! This module:
//! - builds the shared stores (settings, match registry, file cache),
//! - binds the theater listener (a bind failure is fatal),
//! - spawns the idle-session reaper,
//! - runs the accept loop until SIGINT, SIGTERM or SIGQUIT, then shuts down.

use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;

use theater_core::MatchRegistry;
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::config::{Settings, SettingsStore};
use crate::error::ServerError;
use crate::file_cache::FileCache;
use crate::listener::Listener;
use crate::reaper;
use crate::status::StatusReport;
use crate::theater::{TheaterContext, TheaterSession};

/// Run the theater server until a shutdown signal or an accept failure.
pub async fn run(settings: Settings) -> Result<(), ServerError> {
    let addr = settings.theater_addr()?;
    let idle_timeout = Duration::from_secs(settings.theater.idle_timeout_secs.max(1));
    let public_ip = settings.theater.public_ip.clone();
    let files_root = settings.files.root.clone();

    let settings = Arc::new(SettingsStore::new(settings));
    let matchmaker = Arc::new(MatchRegistry::with_public_ip(public_ip));
    let files = Arc::new(FileCache::new());

    if let Some(root) = files_root {
        let cache = Arc::clone(&files);
        match task::spawn_blocking(move || cache.load_dir(&root)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("File cache not loaded: {}", e),
            Err(e) => warn!("File cache loader failed: {}", e),
        }
    }

    let context = Arc::new(TheaterContext::new(
        Arc::clone(&matchmaker),
        Arc::clone(&settings),
        Arc::clone(&files),
    ));

    let theater = match Listener::<TheaterSession>::bind(addr, context, settings).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(server = "theater", "{}", e);
            return Err(e);
        }
    };

    serve(theater, idle_timeout, shutdown_signal()).await
}

/// Run the accept loop and the reaper until `shutdown` resolves or
/// accepting fails, then shut down.
pub async fn serve<F>(
    theater: Arc<Listener<TheaterSession>>,
    idle_timeout: Duration,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let reaper = tokio::spawn(reaper::run(Arc::clone(&theater), idle_timeout));

    let result = tokio::select! {
        result = theater.run() => result,
        _ = shutdown => {
            info!("Shutting down");
            Ok(())
        }
    };

    reaper.abort();
    self::shutdown(&theater).await;
    result
}

/// Resolves on SIGINT, SIGTERM or SIGQUIT (Ctrl-C elsewhere).
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::SignalKind;

        tokio::select! {
            _ = wait_for(SignalKind::interrupt(), "SIGINT") => {}
            _ = wait_for(SignalKind::terminate(), "SIGTERM") => {}
            _ = wait_for(SignalKind::quit(), "SIGQUIT") => {}
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            future::pending::<()>().await;
        }
        info!("Received Ctrl-C");
    }
}

/// Never resolves if the handler cannot be installed.
#[cfg(unix)]
async fn wait_for(kind: tokio::signal::unix::SignalKind, name: &'static str) {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
            info!("Received {}", name);
        }
        Err(e) => {
            warn!("Cannot listen for {}: {}", name, e);
            future::pending::<()>().await;
        }
    }
}

/// Log status, drop every theater session and release the file cache.
/// The match registry is left as is.
async fn shutdown(theater: &Listener<TheaterSession>) {
    let context = theater.context();

    match StatusReport::collect(&context.matchmaker, theater).await.to_json() {
        Ok(json) => debug!("Status at shutdown: {}", json),
        Err(e) => debug!("Status report failed: {}", e),
    }

    theater.disconnect_all().await;
    context.files.unload_all();
}
