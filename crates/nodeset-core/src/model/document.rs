//! A parsed document: namespace metadata plus its nodes.

use serde::{Deserialize, Serialize};

use super::NodeRecord;

/// A namespace declared by a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl NamespaceInfo {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            publication_date: None,
            version: None,
        }
    }
}

/// A self-contained bundle of namespaces and nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub namespaces: Vec<NamespaceInfo>,
    pub nodes: Vec<NodeRecord>,
}

impl Document {
    pub fn new(namespaces: Vec<NamespaceInfo>, nodes: Vec<NodeRecord>) -> Self {
        let mut doc = Self::default();
        for ns in namespaces {
            doc.add_namespace(ns);
        }
        doc.nodes = nodes;
        doc
    }

    /// Add a namespace unless one with the same URI is already present.
    pub fn add_namespace(&mut self, namespace: NamespaceInfo) {
        if !self.namespaces.iter().any(|ns| ns.uri == namespace.uri) {
            self.namespaces.push(namespace);
        }
    }

    /// Append another document.
    ///
    /// Namespaces are de-duplicated by URI (first declaration wins); nodes are
    /// concatenated as-is, duplicates included.
    pub fn merge(&mut self, other: &Document) {
        for ns in &other.namespaces {
            self.add_namespace(ns.clone());
        }
        self.nodes.extend(other.nodes.iter().cloned());
    }

    /// Merge a sequence of documents in order.
    pub fn merged<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Document {
        let mut merged = Document::default();
        for doc in docs {
            merged.merge(doc);
        }
        merged
    }

    /// URIs of all declared namespaces, in declaration order.
    pub fn namespace_uris(&self) -> Vec<String> {
        self.namespaces.iter().map(|ns| ns.uri.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeClass, NodeId};

    fn node(id: u32, name: &str) -> NodeRecord {
        NodeRecord::new(NodeId::numeric(1, id), NodeClass::Object, name)
    }

    #[test]
    fn test_merge_dedups_namespaces_and_keeps_nodes() {
        let mut a = Document::new(
            vec![NamespaceInfo::new("urn:a"), NamespaceInfo::new("urn:shared")],
            vec![node(1, "One")],
        );
        let b = Document::new(
            vec![NamespaceInfo::new("urn:shared"), NamespaceInfo::new("urn:b")],
            vec![node(1, "OneAgain"), node(2, "Two")],
        );

        a.merge(&b);

        assert_eq!(a.namespace_uris(), vec!["urn:a", "urn:shared", "urn:b"]);
        assert_eq!(a.nodes.len(), 3);
        assert_eq!(a.nodes[1].browse_name, "OneAgain");
    }

    #[test]
    fn test_new_dedups_namespaces() {
        let doc = Document::new(
            vec![NamespaceInfo::new("urn:a"), NamespaceInfo::new("urn:a")],
            Vec::new(),
        );
        assert_eq!(doc.namespaces.len(), 1);
    }
}
