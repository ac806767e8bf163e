//! Expansion provenance for cascading collapse.
//!
//! For every expanded node the tracker remembers which node ids that
//! expansion introduced. Collapsing a node walks these records transitively
//! to find everything that has to go.

use crate::domain::NodeId;
use std::collections::{HashMap, HashSet};

/// Maps an expanded node to the ids its expansions introduced.
#[derive(Debug, Default, Clone)]
pub struct ExpansionTracker {
    records: HashMap<NodeId, Vec<NodeId>>,
}

impl ExpansionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `added` to the record of `parent`.
    pub fn record_expansion(&mut self, parent: &NodeId, added: &[NodeId]) {
        if added.is_empty() {
            return;
        }
        self.records
            .entry(parent.clone())
            .or_default()
            .extend_from_slice(added);
    }

    /// Ids recorded directly under `id`, in the order they were introduced.
    #[must_use]
    pub fn introduced_by(&self, id: &NodeId) -> &[NodeId] {
        self.records.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every id reachable from `id` through expansion records.
    ///
    /// Iterative traversal with a visited set, so deep chains cannot overflow
    /// the stack and cycles in the records terminate. `id` itself is never
    /// part of the result.
    #[must_use]
    pub fn collect_descendants(&self, id: &NodeId) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        visited.insert(id.clone());

        let mut stack: Vec<&NodeId> = self.introduced_by(id).iter().collect();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            stack.extend(self.introduced_by(current));
        }

        visited.remove(id);
        visited
    }

    /// Drop the record of `id`.
    pub fn forget(&mut self, id: &NodeId) {
        self.records.remove(id);
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of nodes with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no node has a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
