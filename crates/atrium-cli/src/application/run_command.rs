//! Executes one CLI command against a [`DashboardStore`].
//!
//! Collection commands are written once over [`CollectionView`] and reused
//! for services and feeds.  Partial updates are expressed as a [`Patch`]:
//! the fields the user named replace those of the current item, the rest
//! are kept.
//!
//! The return value says whether a save was attempted and how it went;
//! read-only commands return `None`.  Confirmation messages are written only
//! when the store did not report a failure.

use std::io::{self, Write};

use atrium_core::{
    filter_services, Configuration, DashboardStore, Edit, EditError, Feed, NewsFeeds, Panel,
    Persistence, PersistenceBackend, Service, Services,
};
use thiserror::Error;

use crate::application::render::{self, CollectionView};

/// Errors from [`execute`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to serialize configuration: {0}")]
    Export(#[from] serde_json::Error),
}

// ── Command model ─────────────────────────────────────────────────────────────

/// One user request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a summary of the whole configuration.
    Show,
    /// Print the configuration as pretty JSON.
    Export,
    /// Replace the configuration wholesale.
    Import(Configuration),
    /// Delete the stored document and return to defaults.
    Reset,
    Services(CollectionCommand<Service, ServicePatch>),
    Feeds(CollectionCommand<Feed, FeedPatch>),
    /// List services whose name or description contains the text.
    Search(String),
    Set(Setting),
}

/// An operation on one ordered collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionCommand<T, P> {
    List,
    Add(T),
    Update(usize, P),
    Remove(usize),
    MoveUp(usize),
    MoveDown(usize),
}

/// A top-level setting change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Title(String),
    Theme(String),
    MaxNewsPerFeed(u32),
    Panel(Panel, bool),
}

impl Command {
    /// `true` for commands that write to the backend.
    pub fn is_mutating(&self) -> bool {
        match self {
            Command::Show | Command::Export | Command::Search(_) => false,
            Command::Services(c) => !matches!(c, CollectionCommand::List),
            Command::Feeds(c) => !matches!(c, CollectionCommand::List),
            Command::Import(_) | Command::Reset | Command::Set(_) => true,
        }
    }

    /// `true` for commands that discard data and deserve a confirmation.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Command::Reset
                | Command::Import(_)
                | Command::Services(CollectionCommand::Remove(_))
                | Command::Feeds(CollectionCommand::Remove(_))
        )
    }
}

// ── Patches ───────────────────────────────────────────────────────────────────

/// Partial replacement of a collection item.
pub trait Patch<T> {
    fn apply_to(&self, current: &T) -> T;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl Patch<Service> for ServicePatch {
    fn apply_to(&self, current: &Service) -> Service {
        let pick = |new: &Option<String>, old: &String| new.clone().unwrap_or_else(|| old.clone());
        Service {
            name: pick(&self.name, &current.name),
            url: pick(&self.url, &current.url),
            description: pick(&self.description, &current.description),
            icon: pick(&self.icon, &current.icon),
            color: pick(&self.color, &current.color),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPatch {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl Patch<Feed> for FeedPatch {
    fn apply_to(&self, current: &Feed) -> Feed {
        Feed {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            url: self.url.clone().unwrap_or_else(|| current.url.clone()),
        }
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Runs `command` and writes its output to `out`.
///
/// # Errors
///
/// [`CommandError::Edit`] for an index outside the collection; the store and
/// backend are untouched in that case.  Save failures are not errors: they
/// come back as `Some(Persistence::Failed { .. })`.
pub async fn execute<B, W>(
    store: &mut DashboardStore<B>,
    command: Command,
    out: &mut W,
) -> Result<Option<Persistence>, CommandError>
where
    B: PersistenceBackend,
    W: Write,
{
    match command {
        Command::Show => {
            render::write_summary(out, store.config())?;
            Ok(None)
        }
        Command::Export => {
            writeln!(out, "{}", store.export_json()?)?;
            Ok(None)
        }
        Command::Search(query) => {
            let hits = filter_services(&store.config().services, &query);
            render::write_matches(out, &hits)?;
            Ok(None)
        }
        Command::Import(config) => {
            let (services, feeds) = (config.services.len(), config.news_feeds.len());
            let outcome = store.import(config).await;
            if !outcome.is_failure() {
                writeln!(out, "imported configuration with {services} services and {feeds} feeds")?;
            }
            Ok(Some(outcome))
        }
        Command::Reset => {
            let outcome = store.reset().await;
            if !outcome.is_failure() {
                writeln!(out, "configuration reset to defaults")?;
            }
            Ok(Some(outcome))
        }
        Command::Services(cmd) => run_collection::<Services, _, _, _>(store, cmd, out).await,
        Command::Feeds(cmd) => run_collection::<NewsFeeds, _, _, _>(store, cmd, out).await,
        Command::Set(setting) => {
            let (outcome, what) = match setting {
                Setting::Title(title) => (store.set_title(title).await, "title"),
                Setting::Theme(theme) => (store.set_theme(theme).await, "theme"),
                Setting::MaxNewsPerFeed(max) => {
                    (store.set_max_news_per_feed(max).await, "news per feed")
                }
                Setting::Panel(panel, visible) => {
                    (store.set_panel(panel, visible).await, "panel visibility")
                }
            };
            match outcome {
                Persistence::Saved => writeln!(out, "{what} updated")?,
                Persistence::Unchanged => writeln!(out, "{what} already set")?,
                Persistence::Failed { .. } => {}
            }
            Ok(Some(outcome))
        }
    }
}

async fn run_collection<C, P, B, W>(
    store: &mut DashboardStore<B>,
    command: CollectionCommand<C::Item, P>,
    out: &mut W,
) -> Result<Option<Persistence>, CommandError>
where
    C: CollectionView,
    P: Patch<C::Item>,
    B: PersistenceBackend,
    W: Write,
{
    let noun = C::NOUN;
    match command {
        CollectionCommand::List => {
            C::write_list(out, store.items::<C>())?;
            Ok(None)
        }
        CollectionCommand::Add(item) => {
            let name = C::label(&item).to_string();
            let outcome = store.append::<C>(item).await;
            if !outcome.is_failure() {
                let index = store.items::<C>().len().saturating_sub(1);
                writeln!(out, "added {noun} '{name}' at index {index}")?;
            }
            Ok(Some(outcome))
        }
        CollectionCommand::Update(index, patch) => {
            let items = store.items::<C>();
            let current = items.get(index).cloned().ok_or(EditError::IndexOutOfRange {
                index,
                len: items.len(),
            })?;
            let outcome = store.edit::<C>(Edit::Update(index, patch.apply_to(&current))).await?;
            if !outcome.is_failure() {
                writeln!(out, "updated {noun} {index}")?;
            }
            Ok(Some(outcome))
        }
        CollectionCommand::Remove(index) => {
            let name = store.items::<C>().get(index).map(|i| C::label(i).to_string());
            let outcome = store.edit::<C>(Edit::Remove(index)).await?;
            if let (false, Some(name)) = (outcome.is_failure(), name) {
                writeln!(out, "removed {noun} {index} '{name}'")?;
            }
            Ok(Some(outcome))
        }
        CollectionCommand::MoveUp(index) => {
            let outcome = store.edit::<C>(Edit::MoveUp(index)).await?;
            match outcome {
                Persistence::Unchanged => writeln!(out, "{noun} {index} is already first")?,
                Persistence::Saved => writeln!(out, "moved {noun} {index} up")?,
                Persistence::Failed { .. } => {}
            }
            Ok(Some(outcome))
        }
        CollectionCommand::MoveDown(index) => {
            let outcome = store.edit::<C>(Edit::MoveDown(index)).await?;
            match outcome {
                Persistence::Unchanged => writeln!(out, "{noun} {index} is already last")?,
                Persistence::Saved => writeln!(out, "moved {noun} {index} down")?,
                Persistence::Failed { .. } => {}
            }
            Ok(Some(outcome))
        }
    }
}
