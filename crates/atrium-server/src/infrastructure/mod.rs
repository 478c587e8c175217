//! Infrastructure layer for atrium-server.
//!
//! - [`http`]: axum router, handlers and the listener.
//! - [`storage`]: the `config.json` document store and the TOML settings.
//! - [`proc_stats`]: reads `/proc` for the stats routes.

pub mod http;
pub mod proc_stats;
pub mod storage;

pub use http::{router, run_server, serve, AppState};
pub use proc_stats::ProcStats;
pub use storage::DocumentStore;
