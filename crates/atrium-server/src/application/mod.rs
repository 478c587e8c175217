//! Application layer for atrium-server.
//!
//! [`config_api::ConfigApi`] validates incoming configuration documents and
//! forwards them to whatever [`atrium_core::PersistenceBackend`] the server
//! was started with.  It knows nothing about HTTP; the router in
//! `infrastructure::http` maps its results onto status codes.

pub mod config_api;

pub use config_api::{ApiError, ConfigApi};
