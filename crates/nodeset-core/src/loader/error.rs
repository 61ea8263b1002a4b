//! Loader error types.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::fetch::FetchError;
use crate::storage::StorageError;

/// A document that could not be turned into nodes. Never retried.
#[derive(Debug, Clone, Error)]
#[error("Parse error in {source_url}: {cause}")]
pub struct ParseError {
    pub source_url: String,
    pub cause: String,
}

impl ParseError {
    pub fn new(source_url: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            cause: cause.into(),
        }
    }
}

/// Errors that can occur while loading a catalog entry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Document cache error: {0}")]
    Storage(#[from] StorageError),
}

/// Failure of an ad-hoc ingestion, with a message meant for the user.
#[derive(Debug, Clone, Error)]
#[error("Ingestion failed: {message}")]
pub struct IngestionError {
    pub message: String,
}

impl IngestionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
