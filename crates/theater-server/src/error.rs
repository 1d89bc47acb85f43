//! Server-level errors.
//!
//! Only startup can fail this way: per-request problems are handled
//! inside the session and never surface here.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },

    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
