mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{catalog_with, offline_config, FakeFetcher, SlowFirstReadStore};
use nodeset_core::catalog::builtin_entries;
use nodeset_core::config::{CatalogConfig, CATALOG_OVERRIDES_KEY};
use nodeset_core::{Catalog, CatalogEntry, CatalogError, FetchError, MemoryStore, Store};

const LISTING_URL: &str = "https://listing.test/tree";

fn discovery_config() -> CatalogConfig {
    CatalogConfig {
        discovery_enabled: true,
        discovery_url: LISTING_URL.to_string(),
        raw_base_url: "https://raw.test".to_string(),
        ..CatalogConfig::default()
    }
}

#[tokio::test]
async fn test_defaults_are_core_and_di() {
    let catalog = Catalog::new(
        Arc::new(FakeFetcher::new()),
        Arc::new(MemoryStore::new()),
        offline_config(),
    );

    let slugs: Vec<String> = catalog.defaults().await.into_iter().map(|e| e.slug).collect();
    assert_eq!(slugs, vec!["core", "di"]);
}

#[tokio::test]
async fn test_resolve_missing_slug() {
    let catalog = catalog_with(
        Arc::new(FakeFetcher::new()),
        Arc::new(MemoryStore::new()),
        builtin_entries(),
    );

    match catalog.resolve("missing-slug").await {
        Err(CatalogError::NotFound { slug }) => assert_eq!(slug, "missing-slug"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_override_wins_over_builtin() {
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog_with(Arc::new(FakeFetcher::new()), store.clone(), builtin_entries());

    let mut custom = CatalogEntry::new("CORE", "My Core", "https://mirror.test/core.xml");
    custom.description = Some("Local mirror".to_string());
    catalog.add_or_replace(custom).await.unwrap();

    let core = catalog.resolve("core").await.unwrap();
    assert_eq!(core.name, "My Core");
    assert_eq!(core.source_url, "https://mirror.test/core.xml");
    assert_eq!(core.description.as_deref(), Some("Local mirror"));
    assert!(store.contains_key(CATALOG_OVERRIDES_KEY));

    let count = catalog.list().await.iter().filter(|e| e.slug == "core").count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_overrides_survive_restart() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let first = catalog_with(Arc::new(FakeFetcher::new()), Arc::clone(&store), Vec::new());
    first
        .add_or_replace(CatalogEntry::new("pumps", "Pumps", "https://pumps.test/p.xml"))
        .await
        .unwrap();

    let second = catalog_with(Arc::new(FakeFetcher::new()), store, Vec::new());
    assert_eq!(second.resolve("Pumps").await.unwrap().name, "Pumps");
}

#[tokio::test]
async fn test_remove_override_restores_builtin() {
    let catalog = catalog_with(
        Arc::new(FakeFetcher::new()),
        Arc::new(MemoryStore::new()),
        builtin_entries(),
    );
    catalog
        .add_or_replace(CatalogEntry::new("di", "Replaced", "https://mirror.test/di.xml"))
        .await
        .unwrap();

    assert!(catalog.remove("DI").await.unwrap());
    assert!(!catalog.remove("di").await.unwrap());
    assert_eq!(catalog.resolve("di").await.unwrap().name, "Devices (DI)");
}

#[tokio::test]
async fn test_search_matches_metadata() {
    let catalog = catalog_with(
        Arc::new(FakeFetcher::new()),
        Arc::new(MemoryStore::new()),
        builtin_entries(),
    );

    let hits = catalog.search("ROBOT").await;
    assert!(hits.iter().any(|e| e.slug == "robotics"));
    assert!(hits.iter().all(|e| e.matches("robot")));

    let all = catalog.search("").await;
    assert_eq!(all.len(), catalog.list().await.len());
}

#[tokio::test]
async fn test_discovered_entries_are_merged() {
    let listing = r#"{"tree": [
        {"path": "Schema/Opc.Ua.NodeSet2.xml", "type": "blob"},
        {"path": "Pumps/Opc.Ua.Pumps.NodeSet2.xml", "type": "blob"}
    ]}"#;
    let fetcher = Arc::new(FakeFetcher::new().with_body(LISTING_URL, listing));
    let catalog = Catalog::new(fetcher.clone(), Arc::new(MemoryStore::new()), discovery_config());

    let pumps = catalog.resolve("pumps").await.unwrap();
    assert_eq!(pumps.source_url, "https://raw.test/Pumps/Opc.Ua.Pumps.NodeSet2.xml");

    let core = catalog.resolve("core").await.unwrap();
    assert_eq!(core.name, "OPC UA Core");
    assert_eq!(core.source_url, "https://raw.test/Schema/Opc.Ua.NodeSet2.xml");

    // The listing is cached.
    catalog.list().await;
    assert_eq!(fetcher.calls(), 1);

    catalog.refresh();
    catalog.list().await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_discovery_failure_falls_back_to_builtins() {
    let fetcher = Arc::new(
        FakeFetcher::new().with_error(LISTING_URL, FetchError::transport(LISTING_URL, "connection refused")),
    );
    let catalog = Catalog::new(fetcher.clone(), Arc::new(MemoryStore::new()), discovery_config());

    let entries = catalog.list().await;
    assert_eq!(entries.len(), builtin_entries().len());

    // Failed discovery backs off instead of hitting the source on every read.
    catalog.defaults().await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_added_entry_survives_concurrent_first_read() {
    let store = Arc::new(SlowFirstReadStore::new(Duration::from_millis(100)));
    let catalog = catalog_with(Arc::new(FakeFetcher::new()), store, builtin_entries());

    // The reader loads the empty override list, then stalls.
    let reader = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { catalog.list().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    catalog
        .add_or_replace(CatalogEntry::new("added", "Added", "https://mirror.test/added.xml"))
        .await
        .unwrap();
    assert!(catalog.resolve("added").await.is_ok());

    reader.await.unwrap();
    let added = catalog.resolve("added").await.unwrap();
    assert_eq!(added.name, "Added");
}
