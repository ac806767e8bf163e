//! Identity and merge utilities.
//!
//! Pure functions that combine a validated fragment with existing graph
//! state. Nodes are identified by [`NodeId`], edges by [`EdgeId`]; an
//! incoming entry with a known id is shallow-merged into the existing one
//! (incoming fields win), a new id is inserted. Inputs are never mutated:
//! every function returns fresh collections so the engine can swap its state
//! in one step.

use crate::diagnostics::Diagnostic;
use crate::domain::{EdgeId, GraphEdge, GraphNode, NodeId};
use std::collections::{BTreeMap, HashSet};

/// Nodes keyed by id.
pub type NodeMap = BTreeMap<NodeId, GraphNode>;

/// Edges keyed by id.
pub type EdgeMap = BTreeMap<EdgeId, GraphEdge>;

/// Result of [`merge_nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMerge {
    /// The merged node set.
    pub nodes: NodeMap,

    /// Ids that were not present in `existing`, in fragment order, each once.
    pub added: Vec<NodeId>,
}

/// Result of [`merge_edges`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMerge {
    /// The merged edge set.
    pub edges: EdgeMap,

    /// One entry per incoming edge dropped for an unresolvable endpoint.
    pub diagnostics: Vec<Diagnostic>,
}

/// Merge incoming nodes into a copy of `existing`.
#[must_use]
pub fn merge_nodes(existing: &NodeMap, incoming: &[GraphNode]) -> NodeMerge {
    let mut nodes = existing.clone();
    let mut added = Vec::new();
    let mut seen = HashSet::new();

    for node in incoming {
        match nodes.get_mut(&node.id) {
            Some(current) => current.absorb(node),
            None => {
                nodes.insert(node.id.clone(), node.clone());
            }
        }
        if !existing.contains_key(&node.id) && seen.insert(node.id.clone()) {
            added.push(node.id.clone());
        }
    }

    NodeMerge { nodes, added }
}

/// Merge incoming edges into a copy of `existing`.
///
/// `nodes` is the node set the edges must resolve against, normally the
/// output of [`merge_nodes`] for the same fragment. Incoming edges with an
/// endpoint outside `nodes` are dropped.
#[must_use]
pub fn merge_edges(existing: &EdgeMap, incoming: &[GraphEdge], nodes: &NodeMap) -> EdgeMerge {
    let mut edges = existing.clone();
    let mut diagnostics = Vec::new();

    for edge in incoming {
        if let Some(endpoint) = [&edge.source, &edge.target]
            .into_iter()
            .find(|id| !nodes.contains_key(*id))
        {
            let diagnostic = Diagnostic::DanglingEdge {
                edge_id: edge.id.clone(),
                endpoint: endpoint.clone(),
            };
            diagnostic.emit();
            diagnostics.push(diagnostic);
            continue;
        }

        match edges.get_mut(&edge.id) {
            Some(current) => current.absorb(edge),
            None => {
                edges.insert(edge.id.clone(), edge.clone());
            }
        }
    }

    EdgeMerge { edges, diagnostics }
}
