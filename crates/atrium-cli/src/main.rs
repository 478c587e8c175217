//! `atrium`: edit the dashboard configuration from a terminal.
//!
//! # Usage
//!
//! ```text
//! atrium [--server URL | --file PATH] [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show                      Summary of the whole configuration
//!   export [--output FILE]    Pretty JSON to stdout or a file
//!   import FILE               Replace the configuration with FILE
//!   reset                     Delete the stored configuration
//!   services <list|add|update|remove|up|down>
//!   feeds    <list|add|update|remove|up|down>
//!   search QUERY              Services whose name or description match
//!   set <title|theme|max-news|panel>
//! ```
//!
//! | Variable        | Default                 | Description              |
//! |-----------------|-------------------------|--------------------------|
//! | `ATRIUM_SERVER` | `http://localhost:8001` | atrium-server base URL   |
//! | `ATRIUM_FILE`   | unset                   | Edit a local config.json |
//!
//! Exit status is non-zero when a change could not be saved.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use atrium_cli::application::{
    execute, CollectionCommand, Command, FeedPatch, ServicePatch, Setting,
};
use atrium_cli::infrastructure::HttpBackend;
use atrium_core::{
    ConfigRepository, ConfigSource, Configuration, DashboardStore, Feed, Panel, Persistence,
    PersistenceBackend, SavePolicy, Service,
};
use atrium_server::infrastructure::DocumentStore;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line editor for the Atrium dashboard.
#[derive(Debug, Parser)]
#[command(name = "atrium", about = "Edit the Atrium dashboard configuration", version)]
struct Cli {
    /// Base URL of the atrium-server holding the configuration.
    #[arg(long, default_value = "http://localhost:8001", env = "ATRIUM_SERVER")]
    server: String,

    /// Edit a local configuration file instead of talking to a server.
    /// Takes precedence over `--server`.
    #[arg(long, env = "ATRIUM_FILE")]
    file: Option<PathBuf>,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Undo the in-memory change when the save fails.
    #[arg(long)]
    rollback_on_failure: bool,

    /// Skip confirmation for remove, reset and import.
    #[arg(short, long)]
    yes: bool,

    /// Allow changes even when the stored configuration could not be loaded.
    ///
    /// Without this, a failed load refuses to write, since saving would
    /// replace the stored document with defaults.
    #[arg(long)]
    force: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Print a summary of the configuration.
    Show,
    /// Print the configuration as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the configuration with a JSON file.
    Import { path: PathBuf },
    /// Delete the stored configuration and return to defaults.
    Reset,
    /// Edit the service grid.
    #[command(subcommand)]
    Services(ServiceCommand),
    /// Edit the news feed list.
    #[command(subcommand)]
    Feeds(FeedCommand),
    /// Find services by name or description.
    Search { query: String },
    /// Change a top-level setting.
    #[command(subcommand)]
    Set(SetCommand),
}

#[derive(Debug, Subcommand)]
enum ServiceCommand {
    List,
    Add {
        name: String,
        url: String,
        #[command(flatten)]
        extra: ServiceFields,
    },
    Update {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        extra: ServiceFields,
    },
    Remove { index: usize },
    Up { index: usize },
    Down { index: usize },
}

#[derive(Debug, Args)]
struct ServiceFields {
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    icon: Option<String>,
    /// Category tag used for the card accent.
    #[arg(long)]
    color: Option<String>,
}

#[derive(Debug, Subcommand)]
enum FeedCommand {
    List,
    Add { name: String, url: String },
    Update {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    Remove { index: usize },
    Up { index: usize },
    Down { index: usize },
}

#[derive(Debug, Subcommand)]
enum SetCommand {
    /// Dashboard title.  An empty string restores the default.
    Title { title: String },
    Theme { theme: String },
    /// Headlines shown per feed.
    MaxNews {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
    },
    /// Show or hide an auxiliary panel, e.g. `system-monitor on`.
    Panel {
        panel: Panel,
        #[arg(action = clap::ArgAction::Set, value_parser = parse_switch)]
        visible: bool,
    },
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "show" | "true" | "yes" => Ok(true),
        "off" | "hide" | "false" | "no" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

impl CliCommand {
    /// Converts the parsed subcommand into an application [`Command`].
    ///
    /// # Errors
    ///
    /// Returns an error if an import file cannot be read or is not a
    /// configuration document.
    fn into_command(self) -> anyhow::Result<Command> {
        Ok(match self {
            CliCommand::Show => Command::Show,
            CliCommand::Export { .. } => Command::Export,
            CliCommand::Import { path } => Command::Import(read_import(&path)?),
            CliCommand::Reset => Command::Reset,
            CliCommand::Search { query } => Command::Search(query),
            CliCommand::Services(cmd) => Command::Services(cmd.into_collection_command()),
            CliCommand::Feeds(cmd) => Command::Feeds(cmd.into_collection_command()),
            CliCommand::Set(cmd) => Command::Set(match cmd {
                SetCommand::Title { title } => Setting::Title(title),
                SetCommand::Theme { theme } => Setting::Theme(theme),
                SetCommand::MaxNews { count } => Setting::MaxNewsPerFeed(count),
                SetCommand::Panel { panel, visible } => Setting::Panel(panel, visible),
            }),
        })
    }
}

impl ServiceCommand {
    fn into_collection_command(self) -> CollectionCommand<Service, ServicePatch> {
        match self {
            ServiceCommand::List => CollectionCommand::List,
            ServiceCommand::Add { name, url, extra } => {
                let mut service = Service::new(name, url);
                if let Some(description) = extra.description {
                    service.description = description;
                }
                if let Some(icon) = extra.icon {
                    service.icon = icon;
                }
                if let Some(color) = extra.color {
                    service.color = color;
                }
                CollectionCommand::Add(service)
            }
            ServiceCommand::Update { index, name, url, extra } => CollectionCommand::Update(
                index,
                ServicePatch {
                    name,
                    url,
                    description: extra.description,
                    icon: extra.icon,
                    color: extra.color,
                },
            ),
            ServiceCommand::Remove { index } => CollectionCommand::Remove(index),
            ServiceCommand::Up { index } => CollectionCommand::MoveUp(index),
            ServiceCommand::Down { index } => CollectionCommand::MoveDown(index),
        }
    }
}

impl FeedCommand {
    fn into_collection_command(self) -> CollectionCommand<Feed, FeedPatch> {
        match self {
            FeedCommand::List => CollectionCommand::List,
            FeedCommand::Add { name, url } => CollectionCommand::Add(Feed::new(name, url)),
            FeedCommand::Update { index, name, url } => {
                CollectionCommand::Update(index, FeedPatch { name, url })
            }
            FeedCommand::Remove { index } => CollectionCommand::Remove(index),
            FeedCommand::Up { index } => CollectionCommand::MoveUp(index),
            FeedCommand::Down { index } => CollectionCommand::MoveDown(index),
        }
    }
}

fn read_import(path: &Path) -> anyhow::Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid configuration file", path.display()))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so that `export` output stays clean JSON.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let policy = if cli.rollback_on_failure {
        SavePolicy::RollbackOnFailure
    } else {
        SavePolicy::Optimistic
    };

    match cli.file.clone() {
        Some(path) => run(DocumentStore::at(path), policy, cli).await,
        None => {
            let backend = HttpBackend::new(&cli.server, Duration::from_secs(cli.timeout))?;
            run(backend, policy, cli).await
        }
    }
}

async fn run<B: PersistenceBackend>(backend: B, policy: SavePolicy, cli: Cli) -> anyhow::Result<()> {
    let mut store = DashboardStore::open(ConfigRepository::new(backend), policy).await;

    let output = match &cli.command {
        CliCommand::Export { output } => output.clone(),
        _ => None,
    };
    let command = cli.command.into_command()?;

    if let ConfigSource::Defaults { reason } = store.source() {
        eprintln!("warning: could not load the stored configuration ({reason}); showing defaults");
        if command.is_mutating() && !cli.force {
            bail!("refusing to save over an unreadable configuration; rerun with --force to override");
        }
    }

    if command.is_destructive() && !cli.yes && !confirm("This discards existing data. Continue?")? {
        eprintln!("aborted");
        return Ok(());
    }

    let outcome = match output {
        Some(path) => {
            let mut file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let outcome = execute(&mut store, command, &mut file).await?;
            eprintln!("exported configuration to {}", path.display());
            outcome
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            execute(&mut store, command, &mut out).await?
        }
    };

    if let Some(Persistence::Failed { .. }) = outcome {
        bail!("the change could not be saved; the stored configuration is unchanged");
    }
    Ok(())
}

/// Asks a yes/no question on stderr and reads the answer from stdin.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["atrium"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_default_server_url() {
        let cli = parse(&["show"]);
        assert_eq!(cli.server, "http://localhost:8001");
        assert!(cli.file.is_none());
    }

    #[test]
    fn test_file_accepted_alongside_server() {
        let cli = Cli::try_parse_from([
            "atrium", "--server", "http://x", "--file", "config.json", "show",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("config.json")));
    }

    #[test]
    fn test_services_add_with_fields() {
        // Arrange
        let cli = parse(&[
            "services", "add", "Git", "http://git", "--color", "blue", "--icon", "🐙",
        ]);

        // Act
        let command = cli.command.into_command().unwrap();

        // Assert
        let Command::Services(CollectionCommand::Add(service)) = command else {
            panic!("expected services add");
        };
        assert_eq!(service.name, "Git");
        assert_eq!(service.color, "blue");
        assert_eq!(service.icon, "🐙");
        assert_eq!(service.description, "");
    }

    #[test]
    fn test_services_update_builds_patch() {
        let command = parse(&["services", "update", "2", "--url", "https://git.lan"])
            .command
            .into_command()
            .unwrap();

        assert_eq!(
            command,
            Command::Services(CollectionCommand::Update(
                2,
                ServicePatch {
                    url: Some("https://git.lan".to_string()),
                    ..ServicePatch::default()
                }
            ))
        );
    }

    #[test]
    fn test_feeds_up_maps_to_move_up() {
        let command = parse(&["feeds", "up", "1"]).command.into_command().unwrap();
        assert_eq!(command, Command::Feeds(CollectionCommand::MoveUp(1)));
    }

    #[test]
    fn test_set_panel_parses_slug_and_switch() {
        let command = parse(&["set", "panel", "system-monitor", "on"])
            .command
            .into_command()
            .unwrap();
        assert_eq!(command, Command::Set(Setting::Panel(Panel::SystemMonitor, true)));
    }

    #[test]
    fn test_set_panel_off_hides_panel() {
        let command = parse(&["set", "panel", "k3s-pods", "off"])
            .command
            .into_command()
            .unwrap();
        assert_eq!(command, Command::Set(Setting::Panel(Panel::K3sPods, false)));
    }

    #[test]
    fn test_set_max_news_rejects_zero() {
        let result = Cli::try_parse_from(["atrium", "set", "max-news", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_switch_rejects_garbage() {
        assert_eq!(parse_switch("Hide"), Ok(false));
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_import_of_missing_file_is_error() {
        let cli = parse(&["import", "/nonexistent/atrium.json"]);
        assert!(cli.command.into_command().is_err());
    }

    #[test]
    fn test_import_reads_configuration_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("atrium.json");
        std::fs::write(&path, r#"{"appTitle":"Lab","services":[]}"#).unwrap();

        let command = parse(&["import", path.to_str().unwrap()]).command.into_command().unwrap();

        let Command::Import(config) = command else {
            panic!("expected import");
        };
        assert_eq!(config.app_title, "Lab");
    }
}
