//! Default values for nodeset configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Catalog Defaults
// ============================================================================

/// Directory-tree listing used for remote discovery.
pub const DEFAULT_DISCOVERY_URL: &str =
    "https://api.github.com/repos/OPCFoundation/UA-Nodeset/git/trees/latest?recursive=1";

/// Base URL that discovered file paths are joined onto.
pub const DEFAULT_RAW_BASE_URL: &str =
    "https://raw.githubusercontent.com/OPCFoundation/UA-Nodeset/latest";

/// File name suffix that marks a loadable document in a listing.
pub const DEFAULT_DOCUMENT_SUFFIX: &str = ".NodeSet2.xml";

/// Top-level listing segment that holds the core information model.
pub const CORE_SEGMENT: &str = "Schema";

/// Slug of the core information model.
pub const CORE_SLUG: &str = "core";

/// How long a discovery listing is reused (6 hours).
pub const DEFAULT_DISCOVERY_TTL_SECS: u64 = 6 * 60 * 60;

/// How long to serve built-ins only after a failed discovery (5 minutes).
pub const DEFAULT_DISCOVERY_RETRY_SECS: u64 = 5 * 60;

// ============================================================================
// Loader Defaults
// ============================================================================

/// Simultaneous document fetches in a bulk load.
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// Lifetime of parsed documents in the in-process cache (7 days).
pub const DEFAULT_DOCUMENT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Prefix for generated ingestion slugs.
pub const INGEST_SLUG_PREFIX: &str = "custom";

// ============================================================================
// Fetch Defaults
// ============================================================================

/// Retries after the first attempt when the transport fails.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed pause between transport retries (2 seconds).
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 2_000;

/// Per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("nodeset/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Search Defaults
// ============================================================================

/// Number of hits returned by a query.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Lines per rendered page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Lifetime of rendered node text (12 hours).
pub const DEFAULT_RENDER_TTL_SECS: u64 = 12 * 60 * 60;

/// Forward targets listed per reference type in a synthesized description.
pub const DESCRIPTION_TARGETS_PER_GROUP: usize = 3;

/// Field boost for titles.
pub const TITLE_BOOST: f32 = 3.0;

/// Field boost for browse paths.
pub const BROWSE_PATH_BOOST: f32 = 2.0;

/// Field boost for synthesized descriptions.
pub const DESCRIPTION_BOOST: f32 = 1.0;

/// Field boost for node classes.
pub const NODE_CLASS_BOOST: f32 = 1.0;

// ============================================================================
// Storage Defaults
// ============================================================================

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = ".nodeset";

/// Key prefix for persisted documents.
pub const DOCUMENT_KEY_PREFIX: &str = "nodesets";

/// Key holding user-added catalog entries.
pub const CATALOG_OVERRIDES_KEY: &str = "catalog/overrides";
