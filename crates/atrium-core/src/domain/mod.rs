//! Domain layer for Atrium.
//!
//! Pure data types and pure functions with no I/O, no async, and no logging
//! side effects beyond `tracing` events.  Everything here can be tested by
//! feeding values in and comparing values out.
//!
//! - [`config`]     – the configuration document, its defaults, and the
//!   load-time merge over defaults.
//! - [`collection`] – positional CRUD and reorder over the two ordered lists.
//! - [`search`]     – case-insensitive filtering of the service grid.

pub mod collection;
pub mod config;
pub mod search;
