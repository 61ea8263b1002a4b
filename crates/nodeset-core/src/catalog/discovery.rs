//! Remote discovery of catalog entries from a directory-tree listing.
//!
//! The listing has the shape served by Git hosting tree APIs:
//!
//! ```json
//! { "tree": [ { "path": "DI/Opc.Ua.Di.NodeSet2.xml", "type": "blob" } ],
//!   "truncated": false }
//! ```

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::error::DiscoveryError;
use crate::config::{CatalogConfig, CORE_SEGMENT, CORE_SLUG};
use crate::fetch::Fetcher;
use crate::model::{normalize_slug, CatalogEntry};

#[derive(Debug, Deserialize)]
struct TreeListing {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    #[serde(default)]
    path: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Fetch the listing and derive one candidate entry per document directory.
pub async fn discover(
    fetcher: &dyn Fetcher,
    config: &CatalogConfig,
    builtins: &[CatalogEntry],
) -> Result<Vec<CatalogEntry>, DiscoveryError> {
    let response = fetcher.get(&config.discovery_url).await?;
    let entries = entries_from_listing(&response.text, config, builtins)?;
    tracing::info!(
        "Discovered {} catalog entries from {}",
        entries.len(),
        config.discovery_url
    );
    Ok(entries)
}

/// Derive catalog entries from a listing body.
///
/// The slug comes from the top-level path segment; the first matching file
/// in listing order wins for each slug. Known slugs reuse built-in metadata
/// with the discovered source URL.
pub fn entries_from_listing(
    listing: &str,
    config: &CatalogConfig,
    builtins: &[CatalogEntry],
) -> Result<Vec<CatalogEntry>, DiscoveryError> {
    let listing: TreeListing = serde_json::from_str(listing)?;

    if listing.truncated {
        tracing::warn!(
            "Discovery listing from {} is truncated, continuing with {} items",
            config.discovery_url,
            listing.tree.len()
        );
    }

    let known: HashMap<String, &CatalogEntry> =
        builtins.iter().map(|e| (e.key(), e)).collect();
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for item in &listing.tree {
        if !item.kind.is_empty() && item.kind != "blob" {
            continue;
        }
        if !item.path.ends_with(&config.document_suffix) {
            continue;
        }

        let Some((segment, _)) = item.path.split_once('/') else {
            continue;
        };
        if segment.is_empty() {
            continue;
        }

        let slug = if segment == CORE_SEGMENT {
            CORE_SLUG.to_string()
        } else {
            normalize_slug(segment)
        };
        if !seen.insert(slug.clone()) {
            tracing::debug!("Skipping {} (slug '{}' already discovered)", item.path, slug);
            continue;
        }

        let source_url = format!(
            "{}/{}",
            config.raw_base_url.trim_end_matches('/'),
            item.path
        );

        let entry = match known.get(&slug) {
            Some(builtin) => CatalogEntry {
                source_url,
                ..(*builtin).clone()
            },
            None => {
                let mut entry = CatalogEntry::new(&slug, humanize(segment), source_url);
                entry.tags = BTreeSet::from(["discovered".to_string()]);
                entry
            }
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// Turn a path segment into a display name: `machine-tool` -> `Machine Tool`.
pub fn humanize(segment: &str) -> String {
    segment
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
