//! atrium-cli library crate.
//!
//! The `atrium` binary edits the dashboard configuration from a terminal.  It
//! drives the same [`atrium_core::DashboardStore`] the web dashboard's editor
//! is modelled on, over one of two backends:
//!
//! - [`infrastructure::HttpBackend`] talks to a running `atrium-server`.
//! - `atrium_server::infrastructure::DocumentStore` edits a `config.json` on
//!   disk directly.
//!
//! # Layer rules
//!
//! - `application` turns a parsed [`application::Command`] into store calls
//!   and writes human-readable output; it is generic over the backend.
//! - `infrastructure` holds the reqwest-based backend.

pub mod application;
pub mod infrastructure;
