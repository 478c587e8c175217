//! TOML settings file for the server.
//!
//! Read once at startup from the platform-appropriate location unless
//! `--config` names another file:
//! - Linux:    `~/.config/atrium/server.toml`
//! - macOS:    `~/Library/Application Support/Atrium/server.toml`
//! - Windows:  `%APPDATA%\Atrium\server.toml`
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! port = 8001
//!
//! [storage]
//! data_dir = "/var/lib/atrium"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section and field is optional.  A missing file is not an error: the
//! server starts with the defaults so that first run needs no setup.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ServerConfig;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `bind_address` and `port` do not form a socket address.
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),
}

// ── Settings schema ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default)]
    pub server: ListenSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenSettings {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Directory holding `config.json`.  Unset means the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8001
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerSettings {
    /// Resolves the settings into the runtime [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// [`SettingsError::InvalidBindAddress`] when the address does not parse.
    pub fn to_server_config(&self) -> Result<ServerConfig, SettingsError> {
        let addr = format!("{}:{}", self.server.bind_address, self.server.port);
        let bind_addr: SocketAddr = addr
            .parse()
            .map_err(|_| SettingsError::InvalidBindAddress(addr.clone()))?;

        let data_dir = self
            .storage
            .data_dir
            .clone()
            .or_else(platform_data_dir)
            .unwrap_or_else(|| ServerConfig::default().data_dir);

        Ok(ServerConfig {
            bind_addr,
            data_dir,
            ..ServerConfig::default()
        })
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the default settings file path.
///
/// # Errors
///
/// [`SettingsError::NoPlatformConfigDir`] when neither the XDG variables nor
/// `HOME` (or `APPDATA` on Windows) are set.
pub fn settings_file_path() -> Result<PathBuf, SettingsError> {
    platform_config_dir()
        .map(|dir| dir.join("server.toml"))
        .ok_or(SettingsError::NoPlatformConfigDir)
}

/// Loads settings from `path`, returning the defaults if the file does not
/// exist.
///
/// # Errors
///
/// [`SettingsError::Io`] for file-system errors other than "not found", and
/// [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<ServerSettings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Ok(ServerSettings::default())
        }
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Atrium"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("atrium"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("Atrium"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(|p| PathBuf::from(p).join("Atrium"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })?;
        Some(base.join("atrium"))
    }

    #[cfg(target_os = "macos")]
    {
        platform_config_dir()
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
