//! Persistent key-value storage for parsed documents and catalog overrides.
//!
//! The core only needs `get`/`set`/`remove` on byte values; typed access goes
//! through [`get_json`] and [`set_json`]. Keys in use:
//!
//! ```text
//! nodesets/<slug>        # StoredDocument (tier-1 document cache)
//! catalog/overrides      # Vec<CatalogEntry> added at runtime
//! ```

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::DOCUMENT_KEY_PREFIX;
use crate::model::{normalize_slug, Document};

/// Trait for persistent storage backends.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Removes the value under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and deserializes a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn Store,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes).map_err(|e| StorageError::json(key, e))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serializes and stores a JSON value.
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn Store,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StorageError::json(key, e))?;
    store.set(key, bytes).await
}

/// Storage key of a persisted document.
pub fn document_key(slug: &str) -> String {
    format!("{}/{}", DOCUMENT_KEY_PREFIX, normalize_slug(slug))
}

/// A document as persisted in the tier-1 cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub slug: String,
    pub source_url: String,
    pub cached_at: DateTime<Utc>,
    pub document: Document,
}

impl StoredDocument {
    pub fn new(slug: impl Into<String>, source_url: impl Into<String>, document: Document) -> Self {
        Self {
            slug: slug.into(),
            source_url: source_url.into(),
            cached_at: Utc::now(),
            document,
        }
    }
}
