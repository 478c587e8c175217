//! JSON file holding the configuration document.
//!
//! [`DocumentStore`] is the server-side [`PersistenceBackend`]: one file,
//! `config.json`, in the data directory.  Writes go to a sibling temporary
//! file that is then renamed over the target, so a crash mid-write leaves
//! the previous document in place.
//!
//! ```text
//! store(doc) ─► lock ─► write config.json.tmp ─► rename ─► config.json
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use atrium_core::{BackendError, PersistenceBackend};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::config::DOCUMENT_FILE_NAME;

/// Error type for document file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold valid JSON.
    #[error("corrupt document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { .. } => BackendError::Storage(err.to_string()),
            StoreError::Corrupt { .. } => BackendError::Malformed(err.to_string()),
        }
    }
}

/// Single-file store for the configuration document.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    /// Serializes writers so two renames never interleave.
    write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Creates a store for `config.json` inside `data_dir`.  Nothing is
    /// touched on disk until the first write.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::at(data_dir.as_ref().join(DOCUMENT_FILE_NAME))
    }

    /// Creates a store for an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, `None` when the file does not exist.
    pub async fn read(&self) -> Result<Option<Value>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Atomically replaces the document, creating the directory if needed.
    pub async fn write(&self, document: &Value) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let _guard = self.write_lock.lock().await;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StoreError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &content)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(source));
        }

        debug!(path = %self.path.display(), bytes = content.len(), "document written");
        Ok(())
    }

    /// Removes the document.  Removing an absent file succeeds.
    pub async fn remove(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl PersistenceBackend for DocumentStore {
    async fn fetch(&self) -> Result<Value, BackendError> {
        Ok(self.read().await?.unwrap_or_else(|| json!({})))
    }

    async fn store(&self, document: &Value) -> Result<(), BackendError> {
        Ok(self.write(document).await?)
    }

    async fn delete(&self) -> Result<(), BackendError> {
        Ok(self.remove().await?)
    }

    async fn import(&self, document: &Value) -> Result<(), BackendError> {
        Ok(self.write(document).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path());
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_missing_file_returns_empty_object() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path());
        assert_eq!(store.fetch().await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_file() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path().join("nested").join("data"));
        let doc = json!({"appTitle": "Lab"});

        // Act
        assert_ok!(store.write(&doc).await);

        // Assert
        assert!(store.path().exists());
        assert_eq!(store.read().await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn test_write_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path());
        store.write(&json!({})).await.unwrap();
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_document() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path());
        store.write(&json!({"theme": "nord-frost"})).await.unwrap();
        store.write(&json!({"theme": "one-dark-pro"})).await.unwrap();
        assert_eq!(store.fetch().await.unwrap(), json!({"theme": "one-dark-pro"}));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path());
        store.write(&json!({"a": 1})).await.unwrap();

        assert_ok!(store.remove().await);
        assert_ok!(store.remove().await);
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_maps_to_malformed() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::in_dir(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        // Act
        let result = store.fetch().await;

        // Assert
        assert!(matches!(result, Err(BackendError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_write_into_file_path_parent_fails_as_storage_error() {
        // Arrange: the parent "directory" is a regular file
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = DocumentStore::in_dir(&blocker);

        // Act
        let result = store.store(&json!({})).await;

        // Assert
        assert!(matches!(result, Err(BackendError::Storage(_))));
    }
}
