//! Graph construction.
//!
//! Three passes over the node list:
//!
//! 1. Index nodes by canonical id (first occurrence wins), group each node's
//!    forward references by type and record its declared inverse references
//!    on its own inverse groups.
//! 2. Mirror references onto their targets: a forward reference becomes an
//!    inverse one on the target, a declared inverse reference becomes a
//!    forward one. Targets missing from the graph stay recorded on the
//!    source side only.
//! 3. Resolve browse paths by walking parent chains. Results are memoized,
//!    so the outcome does not depend on node order.

use std::collections::{HashMap, HashSet};

use super::{GraphEntry, NodeGraph, ReferenceGroup};
use crate::model::NodeRecord;

/// Reference types that make their source a child of their target.
pub const PARENT_REFERENCE_TYPES: [&str; 3] = ["HasComponent", "Organizes", "HasProperty"];

// =============================================================================
// Graph Builder
// =============================================================================

pub(super) struct GraphBuilder {
    entries: Vec<GraphEntry>,
    index: HashMap<String, usize>,
    duplicates: usize,
}

impl GraphBuilder {
    pub(super) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            duplicates: 0,
        }
    }

    pub(super) fn build(mut self, nodes: Vec<NodeRecord>, version: u64) -> NodeGraph {
        self.add_nodes(nodes);
        self.mirror_references();
        self.resolve_browse_paths();

        if self.duplicates > 0 {
            tracing::warn!(
                "Skipped {} duplicate node ids while building the graph",
                self.duplicates
            );
        }

        NodeGraph {
            entries: self.entries,
            index: self.index,
            version,
        }
    }

    // -------------------------------------------------------------------------
    // Pass 1
    // -------------------------------------------------------------------------

    fn add_nodes(&mut self, nodes: Vec<NodeRecord>) {
        self.entries.reserve(nodes.len());

        for node in nodes {
            let id = node.node_id.canonical();
            if self.index.contains_key(&id) {
                tracing::debug!("Duplicate node {} ({}), keeping the first", id, node.browse_name);
                self.duplicates += 1;
                continue;
            }

            let mut forward_references = Vec::new();
            let mut inverse_references = Vec::new();
            for reference in &node.references {
                let groups = if reference.is_forward {
                    &mut forward_references
                } else {
                    &mut inverse_references
                };
                add_target(groups, &reference.reference_type, reference.target.canonical());
            }

            self.index.insert(id, self.entries.len());
            self.entries.push(GraphEntry {
                browse_path: node.browse_name.clone(),
                node,
                forward_references,
                inverse_references,
            });
        }
    }

    // -------------------------------------------------------------------------
    // Pass 2
    // -------------------------------------------------------------------------

    fn mirror_references(&mut self) {
        let mut mirrors: Vec<(usize, bool, String, String)> = Vec::new();

        for entry in &self.entries {
            let source = entry.node.node_id.canonical();
            for reference in &entry.node.references {
                let Some(&target) = self.index.get(&reference.target.canonical()) else {
                    continue;
                };
                mirrors.push((
                    target,
                    !reference.is_forward,
                    reference.reference_type.clone(),
                    source.clone(),
                ));
            }
        }

        for (target, forward, reference_type, source) in mirrors {
            let entry = &mut self.entries[target];
            let groups = if forward {
                &mut entry.forward_references
            } else {
                &mut entry.inverse_references
            };
            add_target(groups, &reference_type, source);
        }
    }

    // -------------------------------------------------------------------------
    // Pass 3
    // -------------------------------------------------------------------------

    fn parent_of(&self, entry: &GraphEntry) -> Option<usize> {
        entry
            .inverse_references
            .iter()
            .filter(|group| PARENT_REFERENCE_TYPES.contains(&group.reference_type.as_str()))
            .find_map(|group| {
                group
                    .targets
                    .iter()
                    .find_map(|target| self.index.get(target).copied())
            })
    }

    /// A cycle is cut at the node whose parent is already on the chain being
    /// walked; that node becomes the root of the path.
    fn resolve_browse_paths(&mut self) {
        let parents: Vec<Option<usize>> = self.entries.iter().map(|e| self.parent_of(e)).collect();
        let mut paths: Vec<Option<String>> = vec![None; self.entries.len()];

        for start in 0..self.entries.len() {
            if paths[start].is_some() {
                continue;
            }

            let mut chain = Vec::new();
            let mut on_chain = HashSet::new();
            let mut base: Option<String> = None;
            let mut current = start;
            loop {
                chain.push(current);
                on_chain.insert(current);
                match parents[current] {
                    Some(parent) if paths[parent].is_some() => {
                        base = paths[parent].clone();
                        break;
                    }
                    Some(parent) if !on_chain.contains(&parent) => current = parent,
                    _ => break,
                }
            }

            for &i in chain.iter().rev() {
                let name = &self.entries[i].node.browse_name;
                let path = match &base {
                    Some(prefix) => format!("{}/{}", prefix, name),
                    None => name.clone(),
                };
                paths[i] = Some(path.clone());
                base = Some(path);
            }
        }

        for (entry, path) in self.entries.iter_mut().zip(paths) {
            if let Some(path) = path {
                entry.browse_path = path;
            }
        }
    }
}

/// Add a target to the group for `reference_type`, creating the group on
/// first use. Targets are kept once, in first-seen order.
fn add_target(groups: &mut Vec<ReferenceGroup>, reference_type: &str, target: String) {
    match groups.iter_mut().find(|g| g.reference_type == reference_type) {
        Some(group) => {
            if !group.targets.contains(&target) {
                group.targets.push(target);
            }
        }
        None => groups.push(ReferenceGroup {
            reference_type: reference_type.to_string(),
            targets: vec![target],
        }),
    }
}
