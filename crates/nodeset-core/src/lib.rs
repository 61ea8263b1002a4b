pub mod cache;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod graph;
pub mod loader;
pub mod model;
pub mod search;
pub mod service;
pub mod storage;

pub use cache::TtlCache;
pub use catalog::{Catalog, CatalogError};
pub use config::Config;
pub use fetch::{FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use graph::{GraphEntry, GraphStore, NodeGraph, ReferenceGroup};
pub use loader::{IngestOptions, IngestOutcome, IngestionError, LoadError, Loader, ParseError};
pub use model::{CatalogEntry, Document, NodeClass, NodeId, NodeRecord, Reference};
pub use search::{RenderedPage, SearchDocument, SearchHit, SearchService};
pub use service::{InitStats, NodeSetService};
pub use storage::{FileStore, MemoryStore, Store, StorageError};
