//! Request handling for the stored configuration document.
//!
//! The server stores whatever object the dashboard sends.  It does not merge
//! over defaults or drop unknown keys: that happens on the reading side, in
//! `atrium_core::domain::config::merge_over_defaults`.  The only checks here
//! are the ones that protect the file from being replaced by garbage:
//!
//! - `store` requires a JSON object.
//! - `import` additionally requires that the object reads as a
//!   [`Configuration`], so a file picked by mistake is rejected before it
//!   replaces a working document.

use atrium_core::{BackendError, Configuration, PersistenceBackend};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`ConfigApi`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not an acceptable configuration document.
    #[error("invalid configuration document: {0}")]
    BadRequest(String),

    /// The storage behind the API failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Configuration document operations exposed over HTTP.
#[derive(Debug)]
pub struct ConfigApi<B> {
    backend: B,
}

impl<B: PersistenceBackend> ConfigApi<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the stored document, `{}` when none is stored.
    pub async fn fetch(&self) -> Result<Value, ApiError> {
        Ok(self.backend.fetch().await?)
    }

    /// Replaces the stored document with `body`.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when `body` is not a JSON object.
    pub async fn store(&self, body: &Value) -> Result<(), ApiError> {
        require_object(body)?;
        self.backend.store(body).await?;
        info!(keys = object_len(body), "configuration stored");
        Ok(())
    }

    /// Deletes the stored document.  The next fetch returns `{}`.
    pub async fn delete(&self) -> Result<(), ApiError> {
        self.backend.delete().await?;
        info!("configuration deleted");
        Ok(())
    }

    /// Replaces the stored document with an imported one.
    ///
    /// The body is stored exactly as received once it has been checked to
    /// deserialize as a [`Configuration`].
    pub async fn import(&self, body: &Value) -> Result<(), ApiError> {
        require_object(body)?;
        if let Err(e) = Configuration::deserialize(body) {
            warn!(error = %e, "rejected configuration import");
            return Err(ApiError::BadRequest(e.to_string()));
        }
        self.backend.import(body).await?;
        info!(keys = object_len(body), "configuration imported");
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_object(body: &Value) -> Result<(), ApiError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("expected a JSON object".to_string()))
    }
}

fn object_len(body: &Value) -> usize {
    body.as_object().map_or(0, |o| o.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::MemoryBackend;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn api() -> ConfigApi<MemoryBackend> {
        ConfigApi::new(MemoryBackend::new())
    }

    #[tokio::test]
    async fn test_fetch_with_nothing_stored_returns_empty_object() {
        assert_eq!(api().fetch().await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_store_keeps_document_verbatim() {
        // Arrange: unknown keys must survive a store
        let api = api();
        let doc = json!({"appTitle": "Lab", "customKey": [1, 2, 3]});

        // Act
        assert_ok!(api.store(&doc).await);

        // Assert
        assert_eq!(api.fetch().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_store_rejects_non_object() {
        let api = api();
        let result = api.store(&json!([1, 2])).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(api.backend().document().is_none());
    }

    #[tokio::test]
    async fn test_delete_then_fetch_returns_empty_object() {
        let api = ConfigApi::new(MemoryBackend::with_document(json!({"theme": "nord-frost"})));
        assert_ok!(api.delete().await);
        assert_eq!(api.fetch().await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_import_accepts_valid_configuration() {
        let api = api();
        let doc = json!({
            "services": [{"name": "Git", "url": "http://git"}],
            "newsFeeds": []
        });
        assert_ok!(api.import(&doc).await);
        assert_eq!(api.backend().document(), Some(doc));
    }

    #[tokio::test]
    async fn test_import_accepts_null_optional_service_fields() {
        let api = api();
        let doc = json!({
            "services": [{"name": "NAS", "url": "http://nas", "description": null, "color": null}]
        });

        assert_ok!(api.import(&doc).await);
        assert_eq!(api.backend().document(), Some(doc));
    }

    #[tokio::test]
    async fn test_import_rejects_wrongly_typed_fields() {
        // Arrange: services must be an array of records
        let api = ConfigApi::new(MemoryBackend::with_document(json!({"appTitle": "Keep"})));

        // Act
        let result = api.import(&json!({"services": "not-a-list"})).await;

        // Assert: prior document is untouched
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(api.backend().document(), Some(json!({"appTitle": "Keep"})));
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_backend_error() {
        let api = api();
        api.backend().set_failing(true);
        let result = api.fetch().await;
        assert!(matches!(result, Err(ApiError::Backend(BackendError::Transport(_)))));
    }
}
