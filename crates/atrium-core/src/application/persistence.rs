//! Persistence backend port.
//!
//! A backend holds exactly one configuration document and answers four
//! requests: fetch it, store it, delete it, and import a replacement.  The
//! document travels as untyped JSON so that partial or malformed documents
//! reach [`crate::domain::config::merge_over_defaults`] intact instead of
//! failing deserialization wholesale.
//!
//! Implementations live outside this crate (HTTP client, JSON file); the
//! in-memory [`MemoryBackend`] here is used by tests and by callers that want
//! an ephemeral store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// Error type for a single backend request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached (connection refused, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    Malformed(String),

    /// The backend's own storage failed (disk full, permissions).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Request/response interface to the store holding the configuration document.
///
/// Every call is independently fallible.  `store` and `import` must leave the
/// previously stored document untouched when they fail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Returns the stored document, or `{}` when nothing is stored.
    async fn fetch(&self) -> Result<Value, BackendError>;

    /// Replaces the stored document.
    async fn store(&self, document: &Value) -> Result<(), BackendError>;

    /// Deletes the stored document.  Deleting an absent document succeeds.
    async fn delete(&self) -> Result<(), BackendError>;

    /// Replaces the stored document wholesale with an imported one.
    async fn import(&self, document: &Value) -> Result<(), BackendError>;
}

#[async_trait]
impl<B: PersistenceBackend + ?Sized> PersistenceBackend for Arc<B> {
    async fn fetch(&self) -> Result<Value, BackendError> {
        (**self).fetch().await
    }
    async fn store(&self, document: &Value) -> Result<(), BackendError> {
        (**self).store(document).await
    }
    async fn delete(&self) -> Result<(), BackendError> {
        (**self).delete().await
    }
    async fn import(&self, document: &Value) -> Result<(), BackendError> {
        (**self).import(document).await
    }
}

// ── In-memory backend ─────────────────────────────────────────────────────────

/// Backend that keeps the document in memory.
///
/// Call [`MemoryBackend::set_failing`] to make every subsequent request fail
/// with [`BackendError::Transport`]; the stored document is not touched while
/// failing, matching the contract for real backends.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<Value>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend already holding `document`.
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Toggles failure injection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the stored document, `None` when nothing is stored.
    pub fn document(&self) -> Option<Value> {
        self.lock().clone()
    }

    /// Number of successful `store` and `import` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Value>> {
        // A poisoned lock only means a panicking test thread; the data is still usable.
        self.document.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::Transport("injected failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn replace(&self, document: &Value) -> Result<(), BackendError> {
        self.check()?;
        *self.lock() = Some(document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn fetch(&self) -> Result<Value, BackendError> {
        self.check()?;
        Ok(self.lock().clone().unwrap_or_else(|| json!({})))
    }

    async fn store(&self, document: &Value) -> Result<(), BackendError> {
        self.replace(document)
    }

    async fn delete(&self) -> Result<(), BackendError> {
        self.check()?;
        *self.lock() = None;
        Ok(())
    }

    async fn import(&self, document: &Value) -> Result<(), BackendError> {
        self.replace(document)
    }
}
