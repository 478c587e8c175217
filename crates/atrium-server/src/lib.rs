//! atrium-server library crate.
//!
//! The server is the remote persistence backend for the Atrium dashboard: it
//! stores the single configuration document on disk and serves it over HTTP,
//! next to a small system stats API read from `/proc`.
//!
//! # Architecture
//!
//! ```text
//! Browser / atrium-cli  (JSON over HTTP)
//!         ↕
//! [atrium-server]
//!   ├── domain/           ServerConfig, stats DTOs and /proc parsers
//!   ├── application/      ConfigApi: request validation over PersistenceBackend
//!   └── infrastructure/
//!         ├── http/       axum router and listener
//!         ├── storage/    JSON document file, TOML server settings
//!         └── proc_stats/ reads /proc and feeds the parsers
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `atrium-core` only; it talks to
//!   storage through the `PersistenceBackend` trait.
//! - `infrastructure` depends on all other layers plus `tokio` and `axum`.

/// Domain layer: server configuration and stats types.
pub mod domain;

/// Application layer: config document request handling.
pub mod application;

/// Infrastructure layer: HTTP server, file storage, `/proc` readers.
pub mod infrastructure;
