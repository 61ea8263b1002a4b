//! API request and response types for the HTTP server.

use serde::{Deserialize, Serialize};

use nodeset_core::{CatalogEntry, IngestOptions, SearchHit};

// =============================================================================
// Query Parameters
// =============================================================================

/// Query parameters for `/api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Query parameters for `/api/documents/{id}`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

/// Query parameters for `/api/catalog`.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: String,
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Body of `POST /api/ingest`.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: IngestOptions,
}

// =============================================================================
// Responses
// =============================================================================

/// Response of `/api/search`.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// Response of `POST /api/ingest`.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub entry: CatalogEntry,
    pub nodes: usize,
    pub namespaces: Vec<String>,
}

/// Error body for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
