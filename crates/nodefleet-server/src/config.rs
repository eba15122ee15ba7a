//! Server configuration.
//!
//! The binary builds a [`ServerConfig`] from its command line and
//! environment; the library only ever sees this value.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub addr: SocketAddr,
    /// `SQLite` database file. Created with its parent directory if missing.
    pub db_path: PathBuf,
    /// Externally visible base URL for payload links.
    pub public_url: Option<String>,
    /// Emit JSON log lines.
    pub log_json: bool,
}

impl ServerConfig {
    /// Path to the data directory: `~/.nodefleet/`.
    pub fn data_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".nodefleet"))
    }

    /// Path to the default database: `~/.nodefleet/nodefleet.db`.
    pub fn default_db_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("nodefleet.db"))
    }
}
