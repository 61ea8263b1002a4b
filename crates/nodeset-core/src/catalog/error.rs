//! Catalog error types.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::storage::StorageError;

/// Errors surfaced by catalog operations.
///
/// Discovery failures never show up here; they are absorbed by the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No entry with this slug in the merged catalog.
    #[error("Catalog entry not found: {slug}")]
    NotFound { slug: String },

    /// Reading or writing persisted overrides failed.
    #[error("Catalog storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from remote discovery. Only logged, never propagated to readers.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to fetch discovery listing: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse discovery listing: {0}")]
    Listing(#[from] serde_json::Error),
}
