//! theater-server
//!
//! Multi-client async TCP server for the theater matchmaking protocol.

pub mod config;
pub mod connection;
pub mod error;
pub mod file_cache;
pub mod listener;
pub mod reaper;
pub mod server;
pub mod session;
pub mod status;
pub mod theater;
pub mod types;
