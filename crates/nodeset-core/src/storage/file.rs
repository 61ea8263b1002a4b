use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;

use crate::config::StorageConfig;

use super::error::StorageError;
use super::Store;

/// File-based storage implementation.
///
/// Each key maps to one JSON file under the data directory:
/// ```text
/// .nodeset/
///   nodesets/
///     core.json
///     di.json
///   catalog/
///     overrides.json
/// ```
///
/// Key segments are sanitized for the file system; a segment that had to be
/// altered gets a short fingerprint suffix so distinct keys stay distinct.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Creates a new FileStore with default config.
    pub fn new() -> Self {
        Self::with_config(&StorageConfig::default())
    }

    /// Creates a new FileStore with custom configuration.
    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            base_path: config.data_path(),
        }
    }

    /// Creates a FileStore rooted at an explicit directory.
    pub fn at(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the file backing `key`.
    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let segments: Vec<&str> = key.split('/').collect();
        if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let mut path = self.base_path.clone();
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            let name = sanitize_segment(segment);
            if i == last {
                path.push(format!("{}.json", name));
            } else {
                path.push(name);
            }
        }
        Ok(path)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned == segment {
        return cleaned;
    }

    let mut hasher = Sha256::new();
    hasher.update(segment.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", cleaned, &digest[..8])
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let path = self.key_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        // Write to a sibling file first so readers never see a partial value.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_layout() {
        let store = FileStore::at("/data");
        let path = store.key_path("nodesets/di").unwrap();
        assert_eq!(path, PathBuf::from("/data/nodesets/di.json"));
    }

    #[test]
    fn test_key_path_sanitizes_and_fingerprints() {
        let store = FileStore::at("/data");
        let a = store.key_path("nodesets/a b").unwrap();
        let b = store.key_path("nodesets/a?b").unwrap();
        assert_ne!(a, b);
        assert!(a.to_string_lossy().contains("a_b-"));
    }

    #[test]
    fn test_key_path_rejects_traversal() {
        let store = FileStore::at("/data");
        assert!(matches!(
            store.key_path("nodesets/../etc"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.key_path("").is_err());
    }
}
