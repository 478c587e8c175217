//! Config repository: typed access to the persisted configuration document.
//!
//! The repository is the boundary where backend failures stop.  Every backend
//! call is caught here and turned into either a defaults fallback (`load`) or
//! a `false` return (`save`, `reset`, `import`), logged with `tracing`.
//! Nothing above this layer ever sees a [`BackendError`].
//!
//! # Load fallback chain
//!
//! ```text
//! fetch() ── Err ───────────────► defaults, ConfigSource::Defaults
//!    │
//!    └─ Ok(doc) ── error payload ► defaults, ConfigSource::Defaults
//!          │
//!          └─ merge_over_defaults(doc) ► ConfigSource::Backend
//! ```

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::application::persistence::{BackendError, PersistenceBackend};
use crate::domain::config::{is_error_payload, merge_over_defaults, Configuration};

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The backend answered; the listed keys were absent or malformed and
    /// took their compiled-in defaults.
    Backend { defaulted_fields: Vec<&'static str> },
    /// The backend was unavailable; the configuration is entirely defaults.
    Defaults { reason: String },
}

/// Result of [`ConfigRepository::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub config: Configuration,
    pub source: ConfigSource,
}

impl Loaded {
    fn defaults(reason: String) -> Self {
        Self {
            config: Configuration::default(),
            source: ConfigSource::Defaults { reason },
        }
    }

    /// `true` when the backend could not be used and the caller may want to
    /// tell the user.
    pub fn backend_unavailable(&self) -> bool {
        matches!(self.source, ConfigSource::Defaults { .. })
    }
}

/// Loads and persists the configuration through a [`PersistenceBackend`].
pub struct ConfigRepository<B> {
    backend: B,
}

impl<B> ConfigRepository<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl<B: PersistenceBackend> ConfigRepository<B> {
    /// Fetches the document and merges it over the compiled-in defaults.
    ///
    /// Never fails: a transport error or an error-flagged payload yields a
    /// configuration built entirely from defaults, flagged as
    /// [`ConfigSource::Defaults`].
    pub async fn load(&self) -> Loaded {
        let document = match self.backend.fetch().await {
            Ok(document) => document,
            Err(e) => {
                error!("failed to load config from backend, using defaults: {e}");
                return Loaded::defaults(e.to_string());
            }
        };

        if is_error_payload(&document) {
            let reason = error_reason(&document);
            warn!("backend returned an error payload, using defaults: {reason}");
            return Loaded::defaults(reason);
        }

        let merged = merge_over_defaults(&document);
        debug!(
            services = merged.config.services.len(),
            feeds = merged.config.news_feeds.len(),
            defaulted = ?merged.defaulted,
            "configuration loaded"
        );
        Loaded {
            config: merged.config,
            source: ConfigSource::Backend {
                defaulted_fields: merged.defaulted,
            },
        }
    }

    /// Sends the full document to the backend.  Returns `true` on success.
    pub async fn save(&self, config: &Configuration) -> bool {
        let Some(document) = to_document(config) else {
            return false;
        };
        report("save", self.backend.store(&document).await)
    }

    /// Deletes the stored document so the next `load` returns defaults.
    pub async fn reset(&self) -> bool {
        let ok = report("reset", self.backend.delete().await);
        if ok {
            info!("stored configuration reset to defaults");
        }
        ok
    }

    /// Replaces the stored document wholesale, skipping the defaults merge.
    pub async fn import(&self, config: &Configuration) -> bool {
        let Some(document) = to_document(config) else {
            return false;
        };
        let ok = report("import", self.backend.import(&document).await);
        if ok {
            info!(
                services = config.services.len(),
                feeds = config.news_feeds.len(),
                "configuration imported"
            );
        }
        ok
    }
}

fn to_document(config: &Configuration) -> Option<Value> {
    match serde_json::to_value(config) {
        Ok(document) => Some(document),
        Err(e) => {
            error!("failed to serialize configuration: {e}");
            None
        }
    }
}

fn report(op: &str, result: Result<(), BackendError>) -> bool {
    match result {
        Ok(()) => {
            debug!("backend {op} succeeded");
            true
        }
        Err(e) => {
            error!("backend {op} failed: {e}");
            false
        }
    }
}

fn error_reason(document: &Value) -> String {
    match document.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => "response was not a JSON object".to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
