//! Object storage: the uploads, status records and generated PDFs.
//!
//! The pipeline talks to storage only through [`ObjectStore`], a flat
//! key → bytes map with S3 semantics: whole-object puts, `NotFound` on a
//! missing get, idempotent delete. Two backends ship with the crate:
//!
//! * [`FsObjectStore`] — keys are relative paths under a root directory;
//!   every put is a temp-file write followed by a rename, so readers never
//!   observe a partial object.
//! * [`MemoryObjectStore`] — a `HashMap` behind an async `RwLock`, for tests
//!   and for embedding the pipeline in-process.

use crate::error::StorageError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

pub const CONTENT_TYPE_MARKDOWN: &str = "text/markdown";
pub const CONTENT_TYPE_PDF: &str = "application/pdf";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Flat key → bytes storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object. Missing objects are [`StorageError::NotFound`].
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace an object as a whole.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Remove an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Load and deserialise a JSON object.
pub async fn load_json<T: DeserializeOwned>(store: &dyn ObjectStore, key: &str) -> Result<T, StorageError> {
    let body = store.get(key).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Serialise and store a JSON object.
pub async fn save_json<T: Serialize>(store: &dyn ObjectStore, key: &str, value: &T) -> Result<(), StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(key, body, CONTENT_TYPE_JSON).await
}

// ── Filesystem backend ───────────────────────────────────────────────────

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Objects stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path, refusing anything that would leave the root.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let invalid = |reason: &str| StorageError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if key.is_empty() || key.ends_with('/') {
            return Err(invalid("key must name an object"));
        }
        if key.contains('\\') {
            return Err(invalid("backslashes are not allowed"));
        }
        let rel = Path::new(key);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(invalid("key escapes the store root"));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let write_err = |source: std::io::Error| StorageError::Write {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        // Unique per write so concurrent puts to one key never share a temp file.
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(format!(".{}-{}.tmp", std::process::id(), n));
        let tmp_path = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, &body).await.map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }
        debug!("Stored {} ({} bytes, {})", key, body.len(), content_type);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path).await.map_err(|source| StorageError::Read {
            key: key.to_string(),
            source,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// ── In-memory backend ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// Objects held in process memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded by the last put of `key`.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    /// All keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
