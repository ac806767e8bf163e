//! The canonical node/edge aggregate of one graph view.
//!
//! # Invariant
//!
//! Every edge's `source` and `target` name a node present in the graph. The
//! engine only ever replaces the node and edge sets together, with the
//! output of [`crate::merge`] (which drops dangling edges) or after
//! [`Graph::retract`] (which removes edges together with their endpoints).
//!
//! # Traversal
//!
//! [`Graph::dependency_tree`] projects the view onto a petgraph `DiGraph`
//! and walks it breadth-first. Edges point from dependent to dependency, so
//! outgoing edges of a node are its requirements and versions.

use crate::domain::{EdgeKind, Fragment, GraphEdge, GraphNode, NodeId};
use crate::error::{Error, Result};
use crate::merge::{EdgeMap, NodeMap};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet, VecDeque};

/// Nodes and edges currently materialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: NodeMap,
    edges: EdgeMap,
}

/// One step of a breadth-first dependency walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// The node this entry was reached from.
    pub parent: NodeId,

    /// The reached node.
    pub node: NodeId,

    /// Kind of the edge followed.
    pub edge: EdgeKind,

    /// Distance from the root (1 for direct neighbors).
    pub depth: usize,
}

impl Graph {
    /// A graph holding only `seed`.
    #[must_use]
    pub fn seeded(seed: GraphNode) -> Self {
        let mut nodes = NodeMap::new();
        nodes.insert(seed.id.clone(), seed);
        Self {
            nodes,
            edges: EdgeMap::new(),
        }
    }

    pub(crate) fn from_parts(nodes: NodeMap, edges: EdgeMap) -> Self {
        Self { nodes, edges }
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Whether `id` is present.
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ordered by id.
    #[must_use]
    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    /// All edges, ordered by id.
    #[must_use]
    pub fn edges(&self) -> &EdgeMap {
        &self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges of `kind` pointing at `id`, ordered by edge id.
    pub fn inbound<'a>(
        &'a self,
        id: &'a NodeId,
        kind: EdgeKind,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .values()
            .filter(move |edge| &edge.target == id && edge.kind == kind)
    }

    /// Remove `removed` nodes, every edge touching them, and every edge
    /// leaving `collapsed`. Returns the number of edges removed.
    pub(crate) fn retract(&mut self, collapsed: &NodeId, removed: &HashSet<NodeId>) -> usize {
        self.nodes.retain(|id, _| !removed.contains(id));

        let before = self.edges.len();
        self.edges.retain(|_, edge| {
            &edge.source != collapsed
                && !removed.contains(&edge.source)
                && !removed.contains(&edge.target)
        });
        before - self.edges.len()
    }

    /// Copy the graph out as a fragment, nodes and edges ordered by id.
    #[must_use]
    pub fn to_fragment(&self) -> Fragment {
        Fragment {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Breadth-first walk of the dependencies reachable from `root`.
    ///
    /// Each reachable node appears once, at the depth it was first reached.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if `root` is not in the graph.
    pub fn dependency_tree(&self, root: &NodeId, max_depth: Option<usize>) -> Result<Vec<TreeEntry>> {
        let (graph, node_map) = self.to_petgraph();
        let start = *node_map
            .get(root)
            .ok_or_else(|| Error::NodeNotFound(root.clone()))?;

        let mut result = Vec::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }

            for edge in graph.edges(current) {
                let target = edge.target();
                if visited.insert(target) {
                    queue.push_back((target, depth + 1));
                    result.push(TreeEntry {
                        parent: graph[current].clone(),
                        node: graph[target].clone(),
                        edge: *edge.weight(),
                        depth: depth + 1,
                    });
                }
            }
        }

        Ok(result)
    }

    fn to_petgraph(&self) -> (DiGraph<NodeId, EdgeKind>, HashMap<NodeId, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut node_map = HashMap::with_capacity(self.nodes.len());

        for id in self.nodes.keys() {
            node_map.insert(id.clone(), graph.add_node(id.clone()));
        }
        // petgraph yields a node's edges most-recent first; add in reverse so
        // the walk visits neighbors in edge-id order.
        for edge in self.edges.values().rev() {
            if let (Some(&source), Some(&target)) =
                (node_map.get(&edge.source), node_map.get(&edge.target))
            {
                graph.add_edge(source, target, edge.kind);
            }
        }

        (graph, node_map)
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            nodes: Vec<&'a GraphNode>,
            edges: Vec<&'a GraphEdge>,
        }

        View {
            nodes: self.nodes.values().collect(),
            edges: self.edges.values().collect(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeKind;
    use crate::merge::{merge_edges, merge_nodes};

    fn build(nodes: &[&str], edges: &[(&str, &str, &str)]) -> Graph {
        let nodes: Vec<GraphNode> = nodes
            .iter()
            .map(|id| GraphNode::new(*id, *id, NodeKind::Npm))
            .collect();
        let edges: Vec<GraphEdge> = edges
            .iter()
            .map(|(id, s, t)| GraphEdge::new(*id, *s, *t, EdgeKind::Requires))
            .collect();
        let merged = merge_nodes(&NodeMap::new(), &nodes);
        let merged_edges = merge_edges(&EdgeMap::new(), &edges, &merged.nodes);
        Graph::from_parts(merged.nodes, merged_edges.edges)
    }

    #[test]
    fn test_seeded_graph_has_one_node() {
        let graph = Graph::seeded(GraphNode::new("pkg:foo", "foo", NodeKind::Npm));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.contains_node(&NodeId::new("pkg:foo")));
    }

    #[test]
    fn test_retract_removes_touching_and_outgoing_edges() {
        let mut graph = build(
            &["a", "b", "c", "x"],
            &[("e1", "a", "b"), ("e2", "b", "c"), ("e3", "a", "x"), ("e4", "x", "a")],
        );
        let removed: HashSet<NodeId> = [NodeId::new("b"), NodeId::new("c")].into();

        let removed_edges = graph.retract(&NodeId::new("a"), &removed);

        assert_eq!(removed_edges, 3);
        assert_eq!(graph.node_count(), 2);
        let remaining: Vec<_> = graph.edges().keys().map(|e| e.as_str().to_string()).collect();
        assert_eq!(remaining, vec!["e4"]);
    }

    #[test]
    fn test_inbound_filters_by_kind_and_target() {
        let graph = build(&["a", "b"], &[("e1", "a", "b"), ("e2", "b", "a")]);
        let b = NodeId::new("b");
        let inbound: Vec<_> = graph.inbound(&b, EdgeKind::Requires).collect();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].id.as_str(), "e1");
        assert_eq!(graph.inbound(&b, EdgeKind::HasVersion).count(), 0);
    }

    #[test]
    fn test_dependency_tree_bfs_depths() {
        let graph = build(
            &["a", "b", "c", "d"],
            &[("e1", "a", "b"), ("e2", "a", "c"), ("e3", "b", "d"), ("e4", "c", "d")],
        );

        let tree = graph.dependency_tree(&NodeId::new("a"), None).unwrap();
        let flat: Vec<_> = tree
            .iter()
            .map(|e| (e.parent.as_str(), e.node.as_str(), e.depth))
            .collect();
        assert_eq!(flat, vec![("a", "b", 1), ("a", "c", 1), ("b", "d", 2)]);
    }

    #[test]
    fn test_dependency_tree_respects_max_depth_and_cycles() {
        let graph = build(&["a", "b", "c"], &[("e1", "a", "b"), ("e2", "b", "c"), ("e3", "c", "a")]);

        let limited = graph.dependency_tree(&NodeId::new("a"), Some(1)).unwrap();
        assert_eq!(limited.len(), 1);

        let full = graph.dependency_tree(&NodeId::new("a"), None).unwrap();
        assert_eq!(full.len(), 2);
    }

    #[test]
    fn test_dependency_tree_unknown_root() {
        let graph = build(&["a"], &[]);
        let err = graph.dependency_tree(&NodeId::new("zzz"), None).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
    }

    #[test]
    fn test_serializes_as_node_and_edge_arrays() {
        let graph = build(&["a", "b"], &[("e1", "a", "b")]);
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(json["edges"][0]["type"], "requires");
    }
}
