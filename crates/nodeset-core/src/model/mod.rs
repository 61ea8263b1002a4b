//! Shared value types: node identifiers, references, nodes, documents and
//! catalog entries. Everything else in the crate depends on these.

mod catalog;
mod document;
mod node;

pub use catalog::{normalize_slug, CatalogEntry};
pub use document::{Document, NamespaceInfo};
pub use node::{
    IdentifierKind, LocalizedText, NodeClass, NodeId, NodeIdError, NodeRecord, Reference,
};
