mod common;

use std::sync::Arc;

use common::{catalog_with, motor_entry, FakeFetcher, MOTOR_NODESET, MOTOR_URL, PUMP_NODESET, PUMP_URL};
use nodeset_core::config::{LoaderConfig, SearchConfig};
use nodeset_core::{GraphStore, IngestOptions, Loader, MemoryStore, NodeSetService, SearchService};

fn service(fetcher: Arc<FakeFetcher>) -> NodeSetService {
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog_with(fetcher.clone(), store.clone(), vec![motor_entry()]);
    let loader = Loader::new(Arc::clone(&catalog), fetcher, store, &LoaderConfig::default());
    let graph = Arc::new(GraphStore::new());
    let search = SearchService::new(Arc::clone(&graph), &SearchConfig::default());
    NodeSetService::new(catalog, loader, graph, search)
}

#[tokio::test]
async fn test_initialize_builds_graph_and_index() {
    let fetcher = Arc::new(FakeFetcher::new().with_body(MOTOR_URL, MOTOR_NODESET));
    let service = service(fetcher);
    assert!(!service.is_initialized());

    let stats = service.initialize().await.unwrap();
    assert_eq!(stats.nodes, 2);
    assert_eq!(stats.graph_entries, 2);
    assert_eq!(stats.indexed, 2);
    assert!(service.is_initialized());

    let hits = service.search("SerialNumber");
    assert_eq!(hits[0].document.title, "SerialNumber (Variable)");

    let page = service.render_page(hits[0].document.id, 1).await;
    assert_eq!(page.total_pages, 1);
    assert!(page.content.contains("Motor1/SerialNumber"));
}

#[tokio::test]
async fn test_initialize_fails_loudly() {
    let service = service(Arc::new(FakeFetcher::new()));
    assert!(service.initialize().await.is_err());
    assert!(!service.is_initialized());
}

#[tokio::test]
async fn test_catalog_listing() {
    let service = service(Arc::new(FakeFetcher::new()));
    assert_eq!(service.catalog("").await.len(), 1);
    assert_eq!(service.catalog("motor").await.len(), 1);
    assert!(service.catalog("robot").await.is_empty());
}

#[tokio::test]
async fn test_ingest_makes_nodes_searchable() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .with_body(MOTOR_URL, MOTOR_NODESET)
            .with_body(PUMP_URL, PUMP_NODESET),
    );
    let service = service(fetcher);
    service.initialize().await.unwrap();

    let outcome = service
        .ingest(
            PUMP_URL,
            IngestOptions {
                slug: Some("pumps".to_string()),
                ..IngestOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.entry.slug, "pumps");

    let hits = service.search("FlowRate");
    assert_eq!(hits[0].document.title, "FlowRate (Variable)");
    assert_eq!(hits[0].document.id, 3);
    assert_eq!(service.graph().get_all().len(), 4);
    assert_eq!(service.catalog("pumps").await.len(), 1);

    let text = service.render(hits[0].document.id).await;
    assert!(text.contains("Pump/FlowRate"));
}
