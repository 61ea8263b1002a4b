//! Document loading with a two-tier cache.
//!
//! A load for an entry goes through:
//!
//! 1. The in-process [`TtlCache`] keyed by slug. Concurrent loads of the
//!    same slug wait on a single in-flight computation.
//! 2. The persistent [`Store`] under `nodesets/<slug>`. A hit is used as-is.
//! 3. Fetch and parse. The parsed document is written to the store before
//!    it is returned.
//!
//! A failed or cancelled load leaves neither tier populated.

mod error;
mod parser;

pub use error::{IngestionError, LoadError, ParseError};
pub use parser::parse_nodeset;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::catalog::Catalog;
use crate::config::{LoaderConfig, INGEST_SLUG_PREFIX};
use crate::fetch::Fetcher;
use crate::model::{normalize_slug, CatalogEntry, Document};
use crate::storage::{self, StorageError, Store, StoredDocument};

/// Optional metadata for an ingested document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Slug to register under. Generated when absent.
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub documentation_url: Option<String>,
    pub tags: Vec<String>,
    /// Namespace URIs. Taken from the document when empty.
    pub namespace_uris: Vec<String>,
    pub dependencies: Vec<String>,
    pub default_selection: bool,
}

/// The registered entry and its parsed document.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub entry: CatalogEntry,
    pub document: Arc<Document>,
}

/// Loads catalog entries into parsed documents.
pub struct Loader {
    catalog: Arc<Catalog>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn Store>,
    cache: TtlCache<String, Arc<Document>>,
    max_concurrency: usize,
}

impl Loader {
    pub fn new(
        catalog: Arc<Catalog>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn Store>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            store,
            cache: TtlCache::new(config.cache_ttl()),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// The catalog this loader resolves slugs against.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Load one entry.
    pub async fn load(&self, entry: &CatalogEntry) -> Result<Arc<Document>, LoadError> {
        self.cache
            .get_or_try_init(entry.key(), move || async move {
                self.load_uncached(entry).await.map(Arc::new)
            })
            .await
    }

    /// Load entries with bounded concurrency and merge the results in input
    /// order.
    pub async fn load_many(&self, entries: &[CatalogEntry]) -> Result<Document, LoadError> {
        let documents: Vec<Arc<Document>> = stream::iter(entries)
            .map(|entry| self.load(entry))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        Ok(Document::merged(documents.iter().map(|d| d.as_ref())))
    }

    /// Resolve a slug through the catalog and load it.
    pub async fn load_by_slug(&self, slug: &str) -> Result<Arc<Document>, LoadError> {
        let entry = self.catalog.resolve(slug).await?;
        self.load(&entry).await
    }

    /// Load and merge every default-selected entry.
    ///
    /// Declared dependencies are followed transitively and loaded before
    /// their dependents, each document once. Dependency slugs missing from
    /// the catalog are skipped.
    pub async fn load_defaults(&self) -> Result<Document, LoadError> {
        let all = self.catalog.list().await;

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        for entry in all.iter().filter(|e| e.default_selection) {
            collect_dependencies(entry, &all, &mut visited, &mut ordered);
        }

        tracing::info!(
            "Loading {} default documents: {}",
            ordered.len(),
            ordered
                .iter()
                .map(|e| e.slug.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.load_many(&ordered).await
    }

    /// Fetch an unlisted document and register it in the catalog.
    pub async fn ingest(
        &self,
        url: &str,
        options: IngestOptions,
    ) -> Result<IngestOutcome, IngestionError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(IngestionError::new("No URL given"));
        }

        let slug = match options.slug.as_deref().map(normalize_slug) {
            Some(slug) if !slug.is_empty() => slug,
            _ => generate_slug(),
        };

        let mut entry = CatalogEntry::new(&slug, options.name.clone().unwrap_or_default(), url);
        entry.description = options.description;
        entry.category = options.category;
        entry.documentation_url = options.documentation_url;
        entry.tags = options.tags.into_iter().collect();
        entry.namespace_uris = options.namespace_uris;
        entry.dependencies = options.dependencies;
        entry.default_selection = options.default_selection;

        tracing::info!("Ingesting '{}' from {}", slug, url);

        let document = self
            .fetch_and_parse(&entry)
            .await
            .map_err(|e| IngestionError::new(format!("Could not load {}: {}", url, e)))?;

        if entry.namespace_uris.is_empty() {
            entry.namespace_uris = document.namespace_uris();
        }
        if entry.name.is_empty() {
            entry.name = entry
                .namespace_uris
                .first()
                .cloned()
                .unwrap_or_else(|| slug.clone());
        }

        // Kept so a failed registration can put back what the slug had.
        let key = storage::document_key(&slug);
        let previous_stored = self
            .store
            .get(&key)
            .await
            .map_err(|e| IngestionError::new(format!("Could not read {}: {}", key, e)))?;
        let previous_cached = self.cache.get(&entry.key());

        let stored = StoredDocument::new(&slug, url, document);
        storage::set_json(self.store.as_ref(), &key, &stored)
            .await
            .map_err(|e| IngestionError::new(format!("Could not store {}: {}", slug, e)))?;

        let document = Arc::new(stored.document);
        self.cache.insert(entry.key(), Arc::clone(&document));

        let entry = match self.catalog.add_or_replace(entry).await {
            Ok(entry) => entry,
            Err(e) => {
                match previous_cached {
                    Some(cached) => self.cache.insert(slug.clone(), cached),
                    None => self.cache.invalidate(&slug),
                }
                let restored = match previous_stored {
                    Some(bytes) => self.store.set(&key, bytes).await,
                    None => self.store.remove(&key).await,
                };
                if let Err(restore_err) = restored {
                    tracing::warn!("Failed to roll back stored document {}: {}", key, restore_err);
                }
                return Err(IngestionError::new(format!(
                    "Could not register {}: {}",
                    slug, e
                )));
            }
        };

        tracing::info!(
            "Ingested '{}' ({} nodes, {} namespaces)",
            entry.slug,
            document.nodes.len(),
            document.namespaces.len()
        );
        Ok(IngestOutcome { entry, document })
    }

    async fn load_uncached(&self, entry: &CatalogEntry) -> Result<Document, LoadError> {
        let key = storage::document_key(&entry.slug);
        match storage::get_json::<StoredDocument>(self.store.as_ref(), &key).await {
            Ok(Some(stored)) => {
                tracing::debug!(
                    "Using stored document for '{}' (cached {})",
                    entry.slug,
                    stored.cached_at
                );
                return Ok(stored.document);
            }
            Ok(None) => {}
            Err(e @ StorageError::Json { .. }) => {
                tracing::warn!("Ignoring unreadable stored document: {}", e);
            }
            Err(e) => return Err(e.into()),
        }

        let document = self.fetch_and_parse(entry).await?;

        let stored = StoredDocument::new(&entry.slug, &entry.source_url, document);
        storage::set_json(self.store.as_ref(), &key, &stored).await?;
        Ok(stored.document)
    }

    async fn fetch_and_parse(&self, entry: &CatalogEntry) -> Result<Document, LoadError> {
        tracing::info!("Fetching '{}' from {}", entry.slug, entry.source_url);
        let response = self.fetcher.get(&entry.source_url).await?;

        let parse_entry = entry.clone();
        let document = tokio::task::spawn_blocking(move || {
            parse_nodeset(&response.text, &parse_entry)
        })
        .await
        .map_err(|e| ParseError::new(&entry.source_url, format!("parser task failed: {}", e)))??;

        tracing::info!(
            "Parsed '{}': {} nodes, {} namespaces",
            entry.slug,
            document.nodes.len(),
            document.namespaces.len()
        );
        Ok(document)
    }
}

/// Depth-first, dependencies before dependents.
fn collect_dependencies(
    entry: &CatalogEntry,
    all: &[CatalogEntry],
    visited: &mut HashSet<String>,
    ordered: &mut Vec<CatalogEntry>,
) {
    if !visited.insert(entry.key()) {
        return;
    }
    for dependency in &entry.dependencies {
        let key = normalize_slug(dependency);
        match all.iter().find(|e| e.key() == key) {
            Some(dep) => collect_dependencies(dep, all, visited, ordered),
            None => tracing::debug!(
                "Dependency '{}' of '{}' is not in the catalog",
                dependency,
                entry.slug
            ),
        }
    }
    ordered.push(entry.clone());
}

fn generate_slug() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", INGEST_SLUG_PREFIX, &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, deps: &[&str]) -> CatalogEntry {
        let mut entry = CatalogEntry::new(slug, slug, format!("https://example.com/{}.xml", slug));
        entry.dependencies = deps.iter().map(|d| d.to_string()).collect();
        entry
    }

    #[test]
    fn test_generate_slug() {
        let slug = generate_slug();
        assert!(slug.starts_with("custom-"));
        assert_eq!(slug.len(), "custom-".len() + 8);
        assert!(slug["custom-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_slug(), slug);
    }

    #[test]
    fn test_collect_dependencies_orders_and_dedups() {
        let all = vec![
            entry("core", &[]),
            entry("di", &["core"]),
            entry("machinery", &["di", "core", "missing"]),
        ];

        let mut ordered = Vec::new();
        collect_dependencies(&all[2], &all, &mut HashSet::new(), &mut ordered);

        let slugs: Vec<_> = ordered.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["core", "di", "machinery"]);
    }

    #[test]
    fn test_collect_dependencies_tolerates_cycles() {
        let all = vec![entry("a", &["b"]), entry("b", &["a"])];
        let mut ordered = Vec::new();
        collect_dependencies(&all[0], &all, &mut HashSet::new(), &mut ordered);

        let slugs: Vec<_> = ordered.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a"]);
    }

    #[test]
    fn test_ingest_options_from_json() {
        let options: IngestOptions =
            serde_json::from_str(r#"{"name": "Pumps", "tags": ["fluid"]}"#).unwrap();
        assert_eq!(options.name.as_deref(), Some("Pumps"));
        assert_eq!(options.tags, vec!["fluid"]);
        assert!(options.slug.is_none());
        assert!(!options.default_selection);
    }
}
