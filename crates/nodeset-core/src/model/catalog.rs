//! Catalog entry describing one loadable document source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Normalize a slug for comparison and storage (trim + lowercase).
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

/// Metadata for one document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique key, compared after [`normalize_slug`].
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub namespace_uris: Vec<String>,
    pub source_url: String,
    /// Slugs this source builds on. They need not resolve.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub default_selection: bool,
}

impl CatalogEntry {
    /// Create an entry with only the required fields set.
    pub fn new(slug: impl Into<String>, name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            slug: normalize_slug(&slug.into()),
            name: name.into(),
            description: None,
            category: None,
            documentation_url: None,
            tags: BTreeSet::new(),
            namespace_uris: Vec::new(),
            source_url: source_url.into(),
            dependencies: Vec::new(),
            default_selection: false,
        }
    }

    /// The normalized slug.
    pub fn key(&self) -> String {
        normalize_slug(&self.slug)
    }

    /// Lowercased text that catalog search matches against.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.slug.as_str(), self.name.as_str()];
        parts.extend(self.category.as_deref());
        parts.extend(self.description.as_deref());
        parts.extend(self.documentation_url.as_deref());
        parts.extend(self.tags.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }

    /// Whether this entry matches a free-text query. Empty queries match.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.search_text().contains(&query)
    }
}
