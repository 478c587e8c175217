//! Infrastructure layer for atrium-cli.

pub mod http_backend;

pub use http_backend::HttpBackend;
