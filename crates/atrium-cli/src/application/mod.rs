//! Application layer for atrium-cli.
//!
//! - [`run_command`]: executes one parsed [`Command`] against a
//!   [`atrium_core::DashboardStore`].
//! - [`render`]: plain-text views of the configuration.

pub mod render;
pub mod run_command;

pub use render::CollectionView;
pub use run_command::{
    execute, CollectionCommand, Command, CommandError, FeedPatch, Patch, ServicePatch, Setting,
};
