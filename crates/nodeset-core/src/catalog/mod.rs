//! Catalog of known document sources.
//!
//! The visible entry set is a merge of three layers, keyed by normalized
//! slug, later layers winning:
//!
//! 1. Built-in entries shipped with the crate
//! 2. Entries discovered from a remote directory listing (cached for
//!    `discovery_ttl`)
//! 3. Persisted overrides added through [`Catalog::add_or_replace`]
//!
//! Reads never fail because of discovery: a failed listing is logged and the
//! catalog serves the other layers.

mod builtin;
mod discovery;
mod error;

pub use builtin::builtin_entries;
pub use discovery::{discover, entries_from_listing, humanize};
pub use error::{CatalogError, DiscoveryError};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cache::TtlCache;
use crate::config::{CatalogConfig, CATALOG_OVERRIDES_KEY};
use crate::fetch::Fetcher;
use crate::model::{normalize_slug, CatalogEntry};
use crate::storage::{self, Store};

/// The catalog of document sources.
pub struct Catalog {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn Store>,
    config: CatalogConfig,
    builtins: Vec<CatalogEntry>,
    discovered: TtlCache<(), Arc<Vec<CatalogEntry>>>,
    /// Set while discovery is backing off after a failure.
    discovery_backoff: TtlCache<(), ()>,
    /// Loaded lazily from the store; `None` until the first read succeeds.
    overrides: RwLock<Option<Arc<Vec<CatalogEntry>>>>,
    write_lock: Mutex<()>,
}

impl Catalog {
    /// Create a catalog over the built-in entries.
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn Store>, config: CatalogConfig) -> Self {
        Self::with_builtins(fetcher, store, config, builtin_entries())
    }

    /// Create a catalog with a custom built-in layer.
    pub fn with_builtins(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn Store>,
        config: CatalogConfig,
        builtins: Vec<CatalogEntry>,
    ) -> Self {
        Self {
            fetcher,
            store,
            discovered: TtlCache::new(config.discovery_ttl()),
            discovery_backoff: TtlCache::new(config.discovery_retry()),
            config,
            builtins,
            overrides: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// All entries after merging the three layers.
    pub async fn list(&self) -> Vec<CatalogEntry> {
        let discovered = self.discovered_entries().await;
        let overrides = self.override_entries().await;

        merge_layers([
            self.builtins.as_slice(),
            discovered.as_slice(),
            overrides.as_slice(),
        ])
    }

    /// Entries selected for loading by default.
    pub async fn defaults(&self) -> Vec<CatalogEntry> {
        self.list()
            .await
            .into_iter()
            .filter(|e| e.default_selection)
            .collect()
    }

    /// Look up an entry by slug (case-insensitive).
    pub async fn resolve(&self, slug: &str) -> Result<CatalogEntry, CatalogError> {
        let key = normalize_slug(slug);
        self.list()
            .await
            .into_iter()
            .find(|e| e.key() == key)
            .ok_or_else(|| CatalogError::NotFound {
                slug: slug.to_string(),
            })
    }

    /// Entries whose metadata contains `query`. An empty query matches all.
    pub async fn search(&self, query: &str) -> Vec<CatalogEntry> {
        self.list()
            .await
            .into_iter()
            .filter(|e| e.matches(query))
            .collect()
    }

    /// Persist an entry, replacing any override with the same slug.
    pub async fn add_or_replace(&self, entry: CatalogEntry) -> Result<CatalogEntry, CatalogError> {
        let _guard = self.write_lock.lock().await;

        let mut entry = entry;
        entry.slug = normalize_slug(&entry.slug);

        let mut overrides = self.load_overrides().await?.as_ref().clone();
        match overrides.iter_mut().find(|e| e.key() == entry.slug) {
            Some(existing) => *existing = entry.clone(),
            None => overrides.push(entry.clone()),
        }

        storage::set_json(self.store.as_ref(), CATALOG_OVERRIDES_KEY, &overrides).await?;
        *self.overrides.write() = Some(Arc::new(overrides));

        tracing::info!("Registered catalog entry '{}'", entry.slug);
        Ok(entry)
    }

    /// Remove a persisted override. Returns whether one existed.
    ///
    /// Built-in and discovered entries with the same slug stay visible.
    pub async fn remove(&self, slug: &str) -> Result<bool, CatalogError> {
        let _guard = self.write_lock.lock().await;

        let key = normalize_slug(slug);
        let mut overrides = self.load_overrides().await?.as_ref().clone();
        let before = overrides.len();
        overrides.retain(|e| e.key() != key);
        if overrides.len() == before {
            return Ok(false);
        }

        storage::set_json(self.store.as_ref(), CATALOG_OVERRIDES_KEY, &overrides).await?;
        *self.overrides.write() = Some(Arc::new(overrides));
        Ok(true)
    }

    /// Forget the cached discovery listing so the next read fetches again.
    pub fn refresh(&self) {
        self.discovered.clear();
        self.discovery_backoff.clear();
    }

    async fn discovered_entries(&self) -> Arc<Vec<CatalogEntry>> {
        if !self.config.discovery_enabled || self.discovery_backoff.get(&()).is_some() {
            return Arc::new(Vec::new());
        }

        let result = self
            .discovered
            .get_or_try_init((), move || async move {
                discover(self.fetcher.as_ref(), &self.config, &self.builtins)
                    .await
                    .map(Arc::new)
            })
            .await;

        match result {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Catalog discovery failed, using built-in entries: {}", e);
                self.discovery_backoff.insert((), ());
                Arc::new(Vec::new())
            }
        }
    }

    /// Overrides for readers: storage failures degrade to an empty layer.
    async fn override_entries(&self) -> Arc<Vec<CatalogEntry>> {
        match self.load_overrides().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read persisted catalog entries: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    async fn load_overrides(&self) -> Result<Arc<Vec<CatalogEntry>>, CatalogError> {
        let cached = self.overrides.read().clone();
        if let Some(entries) = cached {
            return Ok(entries);
        }

        let entries: Vec<CatalogEntry> =
            storage::get_json(self.store.as_ref(), CATALOG_OVERRIDES_KEY)
                .await?
                .unwrap_or_default();
        // A writer may have published while the store read was in flight.
        let mut slot = self.overrides.write();
        Ok(Arc::clone(slot.get_or_insert_with(|| Arc::new(entries))))
    }
}

/// Merge layers by normalized slug. A later layer replaces an earlier entry
/// in place; new slugs are appended in layer order.
fn merge_layers<const N: usize>(layers: [&[CatalogEntry]; N]) -> Vec<CatalogEntry> {
    let mut merged: Vec<CatalogEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for layer in layers {
        for entry in layer {
            let key = entry.key();
            match positions.get(&key) {
                Some(&i) => merged[i] = entry.clone(),
                None => {
                    positions.insert(key, merged.len());
                    merged.push(entry.clone());
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, name: &str) -> CatalogEntry {
        CatalogEntry::new(slug, name, format!("https://example.com/{}.xml", slug))
    }

    #[test]
    fn test_merge_layers_precedence_and_order() {
        let builtins = vec![entry("core", "Core"), entry("di", "DI")];
        let discovered = vec![entry("DI", "DI (remote)"), entry("pumps", "Pumps")];
        let overrides = vec![entry("core", "My Core")];

        let merged = merge_layers([&builtins[..], &discovered[..], &overrides[..]]);
        let names: Vec<_> = merged.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["My Core", "DI (remote)", "Pumps"]);
    }
}
