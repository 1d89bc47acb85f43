//! Configuration for the theater server.
//!
//! Settings come from a TOML file (see `theater.toml` at the repository
//! root); a missing file means defaults. A few environment variables
//! override the file afterwards:
//!
//! - `THEATER_BIND_ADDR` (default: "0.0.0.0")
//! - `THEATER_PORT`      (default: "14300")
//!
//! At runtime settings live in a [`SettingsStore`], read-mostly and
//! shared by every session.

use std::env;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use serde::Deserialize;
use theater_core::game::DEFAULT_PUBLIC_IP;

use crate::error::ServerError;

/// Top-level server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// Log connects at `info` instead of `debug`.
    pub show_client_connect: bool,

    /// Log disconnects at `info` instead of `debug`.
    pub show_client_disconnect: bool,

    pub theater: TheaterSettings,
    pub webserver: WebserverSettings,
    pub files: FileSettings,
}

/// `[theater]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TheaterSettings {
    pub port: u16,

    /// Echo inbound frames at `info`.
    pub show_requests: bool,

    /// Echo outbound frames at `info`.
    pub show_responses: bool,

    /// Reaper sweep interval, also the idle threshold.
    pub idle_timeout_secs: u64,

    /// Advertised instead of `10.10.10.*` peers.
    pub public_ip: String,
}

/// `[webserver]` table. Carried for the admin surface, unused here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebserverSettings {
    pub port: u16,
    pub show_requests: bool,
    pub show_responses: bool,
    pub password: String,
}

/// `[files]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Directory preloaded into the file cache at startup.
    pub root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_addr: "0.0.0.0".to_string(),
            show_client_connect: false,
            show_client_disconnect: false,
            theater: TheaterSettings::default(),
            webserver: WebserverSettings::default(),
            files: FileSettings::default(),
        }
    }
}

impl Default for TheaterSettings {
    fn default() -> Self {
        TheaterSettings {
            port: 14300,
            show_requests: false,
            show_responses: false,
            idle_timeout_secs: 60,
            public_ip: DEFAULT_PUBLIC_IP.to_string(),
        }
    }
}

impl Default for WebserverSettings {
    fn default() -> Self {
        WebserverSettings {
            port: 80,
            show_requests: false,
            show_responses: false,
            password: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults if the file
    /// does not exist. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        match fs::read_to_string(path) {
            Ok(text) => Settings::from_toml(&text).map_err(|source| ServerError::Config {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(source) => Err(ServerError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply `THEATER_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<(), ServerError> {
        if let Ok(bind_addr) = env::var("THEATER_BIND_ADDR") {
            self.bind_addr = bind_addr;
        }
        self.theater.port = read_env_or_default("THEATER_PORT", self.theater.port)?;
        Ok(())
    }

    /// Convenience: `addr:port` of the theater listener.
    pub fn theater_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.bind_addr, self.theater.port);
        addr.parse().map_err(|_| ServerError::Address(addr))
    }
}

fn read_env_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ServerError> {
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|_| ServerError::Env { key, value: val }),
        Err(_) => Ok(default),
    }
}

/// Process-wide settings behind a readers-writer lock.
#[derive(Debug, Default)]
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        SettingsStore {
            inner: RwLock::new(settings),
        }
    }

    /// Shared access. Do not hold the guard across an `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
