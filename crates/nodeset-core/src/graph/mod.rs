//! Addressable node graph.
//!
//! [`GraphStore`] holds the current [`NodeGraph`] as an immutable snapshot.
//! [`GraphStore::build`] assembles a complete new graph and swaps it in;
//! readers holding an older snapshot keep seeing it unchanged.

mod builder;

pub use builder::PARENT_REFERENCE_TYPES;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{NodeId, NodeRecord};
use builder::GraphBuilder;

/// Targets of one reference type, as canonical node id strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceGroup {
    pub reference_type: String,
    pub targets: Vec<String>,
}

/// A node together with its grouped references and browse path.
#[derive(Debug, Clone, Serialize)]
pub struct GraphEntry {
    pub node: NodeRecord,
    pub forward_references: Vec<ReferenceGroup>,
    pub inverse_references: Vec<ReferenceGroup>,
    pub browse_path: String,
}

impl GraphEntry {
    pub fn id(&self) -> String {
        self.node.node_id.canonical()
    }
}

/// One immutable build of the graph.
#[derive(Debug, Default)]
pub struct NodeGraph {
    entries: Vec<GraphEntry>,
    index: HashMap<String, usize>,
    version: u64,
}

impl NodeGraph {
    /// Look up an entry by node id. Shorthand ids such as `i=85` are
    /// accepted.
    pub fn get(&self, id: &str) -> Option<&GraphEntry> {
        let key = match id.parse::<NodeId>() {
            Ok(node_id) => node_id.canonical(),
            Err(_) => id.to_string(),
        };
        self.index.get(&key).map(|&i| &self.entries[i])
    }

    /// Entries in input order, duplicates removed.
    pub fn entries(&self) -> &[GraphEntry] {
        &self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build number. Zero means nothing was built yet.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The node records this graph was built from.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.entries.iter().map(|e| &e.node)
    }
}

/// Owner of the current graph snapshot.
pub struct GraphStore {
    current: RwLock<Arc<NodeGraph>>,
    build_lock: Mutex<()>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(NodeGraph::default())),
            build_lock: Mutex::new(()),
        }
    }

    /// Replace the whole graph with one built from `nodes`.
    pub fn build(&self, nodes: Vec<NodeRecord>) -> Arc<NodeGraph> {
        let _guard = self.build_lock.lock();

        let version = self.current.read().version + 1;
        let node_count = nodes.len();
        let graph = Arc::new(GraphBuilder::new().build(nodes, version));

        tracing::debug!(
            "Built graph v{}: {} entries from {} nodes",
            version,
            graph.len(),
            node_count
        );

        *self.current.write() = Arc::clone(&graph);
        graph
    }

    /// Rebuild with the current nodes followed by `nodes`. Existing nodes win
    /// over new ones with the same id.
    pub fn extend(&self, nodes: Vec<NodeRecord>) -> Arc<NodeGraph> {
        let current = self.snapshot();
        let combined: Vec<NodeRecord> = current.nodes().cloned().chain(nodes).collect();
        self.build(combined)
    }

    /// The entry for `id`, if present.
    pub fn get(&self, id: &str) -> Option<GraphEntry> {
        self.current.read().get(id).cloned()
    }

    /// All entries of the current graph.
    pub fn get_all(&self) -> Vec<GraphEntry> {
        self.current.read().entries().to_vec()
    }

    pub fn is_built(&self) -> bool {
        self.current.read().version > 0
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<NodeGraph> {
        Arc::clone(&self.current.read())
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeClass, Reference};

    fn object(id: u32, name: &str) -> NodeRecord {
        NodeRecord::new(NodeId::numeric(1, id), NodeClass::Object, name)
    }

    fn id(n: u32) -> String {
        NodeId::numeric(1, n).canonical()
    }

    #[test]
    fn test_empty_store_is_not_built() {
        let store = GraphStore::new();
        assert!(!store.is_built());
        assert!(store.get_all().is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_build_replaces_graph_and_bumps_version() {
        let store = GraphStore::new();
        store.build(vec![object(1, "A"), object(2, "B")]);
        assert!(store.is_built());
        assert_eq!(store.version(), 1);

        let old = store.snapshot();
        store.build(vec![object(3, "C")]);
        assert_eq!(store.version(), 2);
        assert_eq!(store.get_all().len(), 1);
        assert!(store.get(&id(1)).is_none());
        assert_eq!(old.len(), 2);
    }

    #[test]
    fn test_duplicates_first_wins() {
        let store = GraphStore::new();
        store.build(vec![object(1, "First"), object(1, "Second")]);
        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].node.browse_name, "First");
    }

    #[test]
    fn test_shorthand_lookup() {
        let store = GraphStore::new();
        store.build(vec![NodeRecord::new(
            NodeId::numeric(0, 85),
            NodeClass::Object,
            "Objects",
        )]);
        assert!(store.get("i=85").is_some());
        assert!(store.get("ns=0;i=85").is_some());
        assert!(store.get("not an id").is_none());
    }

    #[test]
    fn test_self_reference_loops_both_ways() {
        let store = GraphStore::new();
        let node = object(1, "Loop").with_reference(Reference::forward("HasEventSource", NodeId::numeric(1, 1)));
        store.build(vec![node]);

        let entry = store.get(&id(1)).unwrap();
        assert_eq!(entry.forward_references[0].targets, vec![id(1)]);
        assert_eq!(entry.inverse_references[0].targets, vec![id(1)]);
    }

    #[test]
    fn test_declared_inverse_is_mirrored_forward() {
        let store = GraphStore::new();
        let folder = object(1, "Folder");
        let child = object(2, "Child").with_reference(Reference::inverse("Organizes", NodeId::numeric(1, 1)));
        store.build(vec![folder, child]);

        let folder = store.get(&id(1)).unwrap();
        assert_eq!(
            folder.forward_references,
            vec![ReferenceGroup {
                reference_type: "Organizes".to_string(),
                targets: vec![id(2)],
            }]
        );
        assert_eq!(store.get(&id(2)).unwrap().browse_path, "Folder/Child");
    }

    #[test]
    fn test_reference_declared_both_ways_is_not_doubled() {
        let store = GraphStore::new();
        let parent = object(1, "Parent").with_reference(Reference::forward("HasComponent", NodeId::numeric(1, 2)));
        let child = object(2, "Child").with_reference(Reference::inverse("HasComponent", NodeId::numeric(1, 1)));
        store.build(vec![parent, child]);

        let child = store.get(&id(2)).unwrap();
        assert_eq!(child.inverse_references.len(), 1);
        assert_eq!(child.inverse_references[0].targets, vec![id(1)]);
        let parent = store.get(&id(1)).unwrap();
        assert_eq!(parent.forward_references[0].targets, vec![id(2)]);
    }

    #[test]
    fn test_dangling_target_recorded_on_source_only() {
        let store = GraphStore::new();
        let node = object(1, "A").with_reference(Reference::forward("HasTypeDefinition", NodeId::numeric(0, 58)));
        store.build(vec![node]);

        assert_eq!(store.get_all().len(), 1);
        let entry = store.get(&id(1)).unwrap();
        assert_eq!(entry.forward_references[0].targets, vec!["ns=0;i=58"]);
        assert!(entry.inverse_references.is_empty());
    }

    #[test]
    fn test_browse_paths_do_not_depend_on_order() {
        let root = object(1, "Root").with_reference(Reference::forward("Organizes", NodeId::numeric(1, 2)));
        let middle = object(2, "Middle").with_reference(Reference::forward("HasComponent", NodeId::numeric(1, 3)));
        let leaf = object(3, "Leaf");

        let store = GraphStore::new();
        store.build(vec![leaf.clone(), middle.clone(), root.clone()]);
        assert_eq!(store.get(&id(3)).unwrap().browse_path, "Root/Middle/Leaf");

        store.build(vec![root, middle, leaf]);
        assert_eq!(store.get(&id(3)).unwrap().browse_path, "Root/Middle/Leaf");
    }

    #[test]
    fn test_parent_types_match_exactly() {
        let parent = object(1, "Parent").with_reference(Reference::forward("HasComponentLike", NodeId::numeric(1, 2)));
        let child = object(2, "Child");

        let store = GraphStore::new();
        store.build(vec![parent, child]);
        assert_eq!(store.get(&id(2)).unwrap().browse_path, "Child");
    }

    #[test]
    fn test_cycle_is_cut() {
        let a = object(1, "A").with_reference(Reference::forward("HasComponent", NodeId::numeric(1, 2)));
        let b = object(2, "B").with_reference(Reference::forward("HasComponent", NodeId::numeric(1, 1)));

        let store = GraphStore::new();
        store.build(vec![a, b]);
        // Walking from A reaches B, whose parent A is already on the chain.
        assert_eq!(store.get(&id(2)).unwrap().browse_path, "B");
        assert_eq!(store.get(&id(1)).unwrap().browse_path, "B/A");
    }

    #[test]
    fn test_extend_keeps_existing_nodes() {
        let store = GraphStore::new();
        store.build(vec![object(1, "Old")]);
        store.extend(vec![object(1, "New"), object(2, "Other")]);

        assert_eq!(store.get_all().len(), 2);
        assert_eq!(store.get(&id(1)).unwrap().node.browse_name, "Old");
        assert_eq!(store.version(), 2);
    }
}
