//! Domain layer for atrium-server.
//!
//! Plain types and pure functions: the runtime [`ServerConfig`] and the
//! system stats model with the parsers that turn `/proc` text into it.
//! Reading the files happens in the infrastructure layer.

pub mod config;
pub mod stats;

pub use config::ServerConfig;
pub use stats::{CpuStats, MemoryStats, NetworkInterface, SystemStats};
