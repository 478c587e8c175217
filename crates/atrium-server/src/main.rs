//! Atrium server: entry point.
//!
//! Serves the dashboard configuration document and the system stats API.
//!
//! # Usage
//!
//! ```text
//! atrium-server [OPTIONS]
//!
//! Options:
//!   --config    <FILE>  Settings file [default: platform config dir]
//!   --bind      <IP>    Address to bind [default: settings or 0.0.0.0]
//!   --port      <PORT>  HTTP port [default: settings or 8001]
//!   --data-dir  <DIR>   Directory holding config.json
//!   --proc-root <DIR>   Proc filesystem root [default: /proc]
//! ```
//!
//! # Precedence
//!
//! CLI flag, then environment variable, then settings file, then built-in
//! default.
//!
//! | Variable           | Overrides              |
//! |--------------------|------------------------|
//! | `ATRIUM_CONFIG`    | `--config`             |
//! | `ATRIUM_BIND`      | `[server] bind_address`|
//! | `ATRIUM_PORT`      | `[server] port`        |
//! | `ATRIUM_DATA_DIR`  | `[storage] data_dir`   |
//! | `ATRIUM_PROC_ROOT` | `--proc-root`          |
//! | `RUST_LOG`         | `[logging] level`      |

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use atrium_server::domain::ServerConfig;
use atrium_server::infrastructure::run_server;
use atrium_server::infrastructure::storage::{load_settings, settings_file_path, ServerSettings};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Atrium dashboard server.
#[derive(Debug, Parser)]
#[command(
    name = "atrium-server",
    about = "Configuration store and system stats API for the Atrium dashboard",
    version
)]
struct Cli {
    /// TOML settings file.  A missing file means built-in defaults.
    #[arg(long, env = "ATRIUM_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind.  `0.0.0.0` accepts connections on every interface.
    #[arg(long, env = "ATRIUM_BIND")]
    bind: Option<String>,

    /// TCP port for the HTTP listener.
    #[arg(long, env = "ATRIUM_PORT")]
    port: Option<u16>,

    /// Directory holding the configuration document.
    #[arg(long, env = "ATRIUM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Root of the proc filesystem.  Point at a bind mount of the host's
    /// `/proc` when running in a container.
    #[arg(long, default_value = "/proc", env = "ATRIUM_PROC_ROOT")]
    proc_root: PathBuf,
}

impl Cli {
    /// Loads the settings file named by `--config`, or the platform default.
    fn load_settings(&self) -> anyhow::Result<ServerSettings> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => match settings_file_path() {
                Ok(path) => path,
                Err(_) => return Ok(ServerSettings::default()),
            },
        };
        load_settings(&path).with_context(|| format!("failed to load settings from {}", path.display()))
    }

    /// Layers the CLI overrides on top of `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting bind address does not parse.
    fn into_server_config(self, mut settings: ServerSettings) -> anyhow::Result<ServerConfig> {
        if let Some(bind) = self.bind {
            settings.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = self.data_dir {
            settings.storage.data_dir = Some(dir);
        }

        let config = settings
            .to_server_config()
            .context("invalid server address")?;

        Ok(ServerConfig {
            proc_root: self.proc_root,
            ..config
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    // RUST_LOG wins over the settings file.
    let default_level = settings.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = cli.into_server_config(settings)?;

    info!(
        "Atrium server starting: bind={}, data_dir={}",
        config.bind_addr,
        config.data_dir.display()
    );

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, initiating graceful shutdown"),
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    };

    run_server(config, shutdown).await?;

    info!("Atrium server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
