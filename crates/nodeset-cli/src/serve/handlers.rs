//! HTTP route handlers.
//!
//! Handlers are kept thin, delegating to [`NodeSetService`].
//!
//! [`NodeSetService`]: nodeset_core::NodeSetService

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use nodeset_core::{CatalogEntry, RenderedPage};

use super::guides::{Guide, GUIDES};
use super::models::{
    CatalogQuery, ErrorResponse, IngestRequest, IngestResponse, PageQuery, SearchQuery,
    SearchResponse,
};
use super::AppState;

/// GET `/api/search?q=` - Ranked search over indexed nodes.
pub async fn api_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let results = state.service.search(&params.q);
    Json(SearchResponse {
        query: params.q,
        results,
    })
}

/// GET `/api/documents/{id}?page=` - One page of a rendered node.
///
/// Unknown ids and out-of-range pages are not errors; they come back as a
/// not-found note or an empty page.
pub async fn api_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<usize>,
    Query(params): Query<PageQuery>,
) -> Json<RenderedPage> {
    Json(state.service.render_page(id, params.page).await)
}

/// GET `/api/catalog?q=` - Catalog entries, optionally filtered.
pub async fn api_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQuery>,
) -> Json<Vec<CatalogEntry>> {
    Json(state.service.catalog(&params.q).await)
}

/// POST `/api/ingest` - Fetch and register a document by URL.
pub async fn api_ingest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.service.ingest(&request.url, request.options).await {
        Ok(outcome) => Ok(Json(IngestResponse {
            nodes: outcome.document.nodes.len(),
            namespaces: outcome.document.namespace_uris(),
            entry: outcome.entry,
        })),
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: e.message }),
        )),
    }
}

/// GET `/api/guides` - Static reading guides.
pub async fn api_guides() -> Json<&'static [Guide]> {
    Json(GUIDES)
}
