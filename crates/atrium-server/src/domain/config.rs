//! Server runtime configuration.
//!
//! [`ServerConfig`] is built once at startup from the settings file and CLI
//! flags, then handed to the HTTP layer.  No environment reads happen here.

use std::net::SocketAddr;
use std::path::PathBuf;

/// File name of the stored configuration document inside the data directory.
pub const DOCUMENT_FILE_NAME: &str = "config.json";

/// All runtime configuration for the server.
///
/// # Example
///
/// ```rust
/// use atrium_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8001);
/// assert!(cfg.document_path().ends_with("config.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// Directory holding the configuration document.
    pub data_dir: PathBuf,
    /// Root of the proc filesystem read by the stats endpoints.
    pub proc_root: PathBuf,
}

impl ServerConfig {
    /// Full path of the stored configuration document.
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE_NAME)
    }
}

impl Default for ServerConfig {
    /// | Field      | Default        |
    /// |------------|----------------|
    /// | bind_addr  | `0.0.0.0:8001` |
    /// | data_dir   | `data`         |
    /// | proc_root  | `/proc`        |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            data_dir: PathBuf::from("data"),
            proc_root: PathBuf::from("/proc"),
        }
    }
}
