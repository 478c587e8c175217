//! On-disk storage: the configuration document file and the server settings.

pub mod document;
pub mod settings;

pub use document::{DocumentStore, StoreError};
pub use settings::{load_settings, settings_file_path, ServerSettings, SettingsError};
