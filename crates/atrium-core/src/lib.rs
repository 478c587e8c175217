//! # atrium-core
//!
//! Shared library for the Atrium dashboard containing the configuration
//! document model, the ordered collection editor, and the config repository
//! that talks to a pluggable persistence backend.
//!
//! This crate is used by both the server and the command-line editor.  It has
//! no dependencies on sockets, files, or HTTP clients: persistence is reached
//! only through the [`PersistenceBackend`] trait.
//!
//! # Architecture overview
//!
//! Atrium is a personal homepage: a grid of service shortcuts, an RSS news
//! panel, and optional monitoring panels, all driven by one JSON document.
//!
//! - **`domain`** – Pure data and pure functions.  [`Configuration`] and its
//!   records, the compiled-in defaults, the per-field merge used at load time,
//!   and the positional CRUD + reorder editor ([`apply_edit`]).
//!
//! - **`application`** – Orchestration.  [`ConfigRepository`] turns every
//!   backend failure into a boolean or a defaults fallback, and
//!   [`DashboardStore`] owns the single in-memory configuration, applying an
//!   edit and then persisting the full document.
//!
//! ```text
//! UI event ─► DashboardStore::edit ─► apply_edit (in memory)
//!                     │
//!                     └─► ConfigRepository::save ─► PersistenceBackend::store
//! ```

pub mod application;
pub mod domain;

pub use application::persistence::{BackendError, MemoryBackend, PersistenceBackend};
pub use application::repository::{ConfigRepository, ConfigSource, Loaded};
pub use application::store::{DashboardStore, Persistence, SavePolicy};
pub use domain::collection::{apply_edit, Collection, Edit, EditEffect, EditError, NewsFeeds, Services};
pub use domain::config::{Configuration, Feed, Panel, PanelVisibility, Service};
pub use domain::search::filter_services;
