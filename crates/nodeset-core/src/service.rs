//! Top-level wiring of catalog, loader, graph and search.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::graph::GraphStore;
use crate::loader::{IngestOptions, IngestOutcome, IngestionError, LoadError, Loader};
use crate::model::CatalogEntry;
use crate::search::{RenderedPage, SearchHit, SearchService};
use crate::storage::Store;

/// Summary of an [`NodeSetService::initialize`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStats {
    pub nodes: usize,
    pub graph_entries: usize,
    pub indexed: usize,
}

/// The assembled service.
pub struct NodeSetService {
    catalog: Arc<Catalog>,
    loader: Loader,
    graph: Arc<GraphStore>,
    search: SearchService,
    update_lock: Mutex<()>,
}

impl NodeSetService {
    /// Assemble from already constructed components. `search` must read from
    /// `graph`.
    pub fn new(
        catalog: Arc<Catalog>,
        loader: Loader,
        graph: Arc<GraphStore>,
        search: SearchService,
    ) -> Self {
        Self {
            catalog,
            loader,
            graph,
            search,
            update_lock: Mutex::new(()),
        }
    }

    /// Build every component from configuration around the given fetcher
    /// and store.
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>, store: Arc<dyn Store>) -> Self {
        let catalog = Arc::new(Catalog::new(
            Arc::clone(&fetcher),
            Arc::clone(&store),
            config.catalog.clone(),
        ));
        let loader = Loader::new(Arc::clone(&catalog), fetcher, store, &config.loader);
        let graph = Arc::new(GraphStore::new());
        let search = SearchService::new(Arc::clone(&graph), &config.search);
        Self::new(catalog, loader, graph, search)
    }

    /// Load the default documents, build the graph and index it.
    pub async fn initialize(&self) -> Result<InitStats, LoadError> {
        let document = self.loader.load_defaults().await?;
        let nodes = document.nodes.len();

        let _guard = self.update_lock.lock();
        let graph = self.graph.build(document.nodes);
        self.search.build_index(graph.entries());

        let stats = InitStats {
            nodes,
            graph_entries: graph.len(),
            indexed: self.search.len(),
        };
        tracing::info!(
            "Initialized: {} nodes, {} graph entries, {} indexed",
            stats.nodes,
            stats.graph_entries,
            stats.indexed
        );
        Ok(stats)
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_built()
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.search.search(query)
    }

    pub async fn render(&self, id: usize) -> Arc<String> {
        self.search.render(id).await
    }

    pub async fn render_page(&self, id: usize, page: usize) -> RenderedPage {
        self.search.render_page(id, page).await
    }

    /// Catalog entries matching `query`. An empty query lists everything.
    pub async fn catalog(&self, query: &str) -> Vec<CatalogEntry> {
        self.catalog.search(query).await
    }

    /// Ingest a document and make its nodes searchable.
    ///
    /// The graph is rebuilt with the new nodes added after the existing
    /// ones; nodes that were not in the graph before are appended to the
    /// index.
    pub async fn ingest(
        &self,
        url: &str,
        options: IngestOptions,
    ) -> Result<IngestOutcome, IngestionError> {
        let outcome = self.loader.ingest(url, options).await?;

        let _guard = self.update_lock.lock();
        let before = self.graph.snapshot().len();
        let graph = self.graph.extend(outcome.document.nodes.clone());
        let added = self.search.append(&graph.entries()[before..]);
        self.search.clear_renders();

        tracing::info!(
            "Added {} nodes from '{}' to the graph and index",
            added.len(),
            outcome.entry.slug
        );
        Ok(outcome)
    }

    pub fn catalog_handle(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    pub fn search_service(&self) -> &SearchService {
        &self.search
    }
}
