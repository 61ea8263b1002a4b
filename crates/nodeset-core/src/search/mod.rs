//! Full-text search over graph entries and cached detail rendering.
//!
//! Every indexed entry becomes a [`SearchDocument`] with a dense integer id,
//! assigned in indexing order from 0. The id is the handle that search
//! results carry and that [`SearchService::render`] takes. Ids are never
//! reused: [`SearchService::append`] continues the sequence.
//!
//! Rendered text is cached per id for the configured lifetime. Concurrent
//! renders of one id share a single computation.

mod index;
mod render;

pub use index::{tokenize, Field, SearchIndex};
pub use render::{paginate, render_entry, render_not_found, render_unknown_document, RenderedPage};

use parking_lot::RwLock;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::{SearchConfig, DESCRIPTION_TARGETS_PER_GROUP};
use crate::graph::{GraphEntry, GraphStore};
use crate::model::{NodeClass, NodeRecord};

/// A searchable view of one graph entry.
#[derive(Debug, Clone, Serialize)]
pub struct SearchDocument {
    pub id: usize,
    pub node_id: String,
    pub title: String,
    pub description: String,
    pub node_class: NodeClass,
    pub browse_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip)]
    pub node: NodeRecord,
}

impl SearchDocument {
    fn from_entry(id: usize, entry: &GraphEntry) -> Self {
        Self {
            id,
            node_id: entry.id(),
            title: format!("{} ({})", entry.node.browse_name, entry.node.node_class),
            description: synthesize_description(entry),
            node_class: entry.node.node_class,
            browse_path: entry.browse_path.clone(),
            namespace: entry.node.namespace_uri.clone(),
            node: entry.node.clone(),
        }
    }
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub score: f32,
    #[serde(flatten)]
    pub document: SearchDocument,
}

/// Description text, browse path and a short summary of forward
/// references, joined with ` | `.
pub fn synthesize_description(entry: &GraphEntry) -> String {
    let mut parts = Vec::new();

    if let Some(description) = &entry.node.description {
        if !description.text.trim().is_empty() {
            parts.push(description.text.trim().to_string());
        }
    }
    if !entry.browse_path.is_empty() {
        parts.push(format!("Browse Path: {}", entry.browse_path));
    }
    for group in &entry.forward_references {
        let targets: Vec<&str> = group
            .targets
            .iter()
            .take(DESCRIPTION_TARGETS_PER_GROUP)
            .map(String::as_str)
            .collect();
        if !targets.is_empty() {
            parts.push(format!("{}: {}", group.reference_type, targets.join(", ")));
        }
    }

    parts.join(" | ")
}

#[derive(Default)]
struct IndexState {
    documents: Vec<SearchDocument>,
    index: SearchIndex,
}

impl IndexState {
    fn push(&mut self, entry: &GraphEntry) {
        let id = self.documents.len();
        let document = SearchDocument::from_entry(id, entry);
        self.index.insert(
            id,
            &[
                (Field::Title, document.title.as_str()),
                (Field::BrowsePath, document.browse_path.as_str()),
                (Field::Description, document.description.as_str()),
                (Field::NodeClass, document.node_class.as_str()),
            ],
        );
        self.documents.push(document);
    }
}

/// Search index plus render cache over a shared graph.
pub struct SearchService {
    graph: Arc<GraphStore>,
    state: RwLock<IndexState>,
    renders: TtlCache<usize, Arc<String>>,
    max_results: usize,
    page_size: usize,
}

impl SearchService {
    pub fn new(graph: Arc<GraphStore>, config: &SearchConfig) -> Self {
        Self {
            graph,
            state: RwLock::new(IndexState::default()),
            renders: TtlCache::new(config.render_ttl()),
            max_results: config.max_results,
            page_size: config.page_size.max(1),
        }
    }

    /// Replace the index with one built from `entries`.
    pub fn build_index(&self, entries: &[GraphEntry]) {
        let mut state = IndexState::default();
        for entry in entries {
            state.push(entry);
        }

        tracing::info!(
            "Indexed {} documents ({} distinct terms)",
            state.documents.len(),
            state.index.vocabulary_len()
        );

        *self.state.write() = state;
        self.renders.clear();
    }

    /// Index more entries. Returns the ids they were given.
    pub fn append(&self, entries: &[GraphEntry]) -> std::ops::Range<usize> {
        let mut state = self.state.write();
        let start = state.documents.len();
        for entry in entries {
            state.push(entry);
        }
        let end = state.documents.len();
        tracing::info!("Appended {} documents to the index", end - start);
        start..end
    }

    /// The best matches for `query`, at most the configured number.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let state = self.state.read();
        state
            .index
            .search(query, self.max_results)
            .into_iter()
            .filter_map(|(id, score)| {
                state.documents.get(id).map(|document| SearchHit {
                    score,
                    document: document.clone(),
                })
            })
            .collect()
    }

    /// The Markdown detail text for document `id`.
    ///
    /// Missing documents and nodes no longer in the graph render as a short
    /// not-found note.
    pub async fn render(&self, id: usize) -> Arc<String> {
        if id >= self.len() {
            return Arc::new(render_unknown_document(id));
        }

        let result = self
            .renders
            .get_or_try_init(id, move || async move {
                Ok::<_, Infallible>(Arc::new(self.render_uncached(id)))
            })
            .await;
        match result {
            Ok(text) => text,
            Err(never) => match never {},
        }
    }

    /// One page of [`render`](Self::render).
    pub async fn render_page(&self, id: usize, page: usize) -> RenderedPage {
        let text = self.render(id).await;
        paginate(&text, page, self.page_size)
    }

    pub fn document(&self, id: usize) -> Option<SearchDocument> {
        self.state.read().documents.get(id).cloned()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget cached render text. Called after the graph changes.
    pub fn clear_renders(&self) {
        self.renders.clear();
    }

    fn render_uncached(&self, id: usize) -> String {
        let node_id = match self.state.read().documents.get(id) {
            Some(document) => document.node_id.clone(),
            None => return render_unknown_document(id),
        };

        match self.graph.get(&node_id) {
            Some(entry) => render_entry(&entry),
            None => {
                tracing::debug!("Document {} points at {}, which is not in the graph", id, node_id);
                render_not_found(&node_id)
            }
        }
    }
}
