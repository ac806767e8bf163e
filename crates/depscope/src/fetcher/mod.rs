//! Neighborhood fetcher: the boundary between the engine and the outside.
//!
//! This module provides the source trait the engine expands through, and
//! the adapter logic on both sides of it:
//!
//! - **Request shaping**: [`NeighborhoodRequest::for_node`] turns a node's
//!   kind and identity into the request a source understands.
//! - **Normalization**: [`normalize`] turns a [`RawFragment`] into a
//!   validated [`Fragment`], dropping malformed entries with a
//!   [`Diagnostic`] each. Nothing with a missing id gets past this point.
//!
//! # Sources
//!
//! - [`fixture::FixtureSource`]: canned neighborhoods loaded from a YAML or
//!   JSON file
//!
//! Transport concerns (HTTP, retries, auth refresh, timeouts) belong inside
//! a source implementation, never in the engine.
//!
//! # Example
//!
//! ```
//! use depscope::domain::{GraphNode, NodeKind};
//! use depscope::fetcher::NeighborhoodRequest;
//! use depscope::graph::Graph;
//!
//! let node = GraphNode::new("pkg:npm/left-pad", "left-pad", NodeKind::Npm);
//! let graph = Graph::seeded(node.clone());
//! let request = NeighborhoodRequest::for_node(&node, &graph);
//! assert_eq!(request.identity(), "pkg:npm/left-pad");
//! ```

pub mod fixture;

use crate::diagnostics::Diagnostic;
use crate::domain::{
    EdgeKind, FILE_ID_PROP, Fragment, GraphEdge, GraphNode, NodeKind, PURL_PROP, RawFragment,
};
use crate::error::FetchError;
use crate::graph::Graph;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source of node neighborhoods.
///
/// Implementations must be `Send + Sync`; the engine holds one behind an
/// `Arc` and may call `fetch` for several nodes concurrently.
///
/// A fragment may repeat nodes and edges the engine already knows about;
/// merging makes that harmless.
#[async_trait]
pub trait NeighborhoodSource: Send + Sync {
    /// Fetch the immediate neighborhood described by `request`.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] means the expansion did not happen.
    async fn fetch(&self, request: &NeighborhoodRequest) -> Result<RawFragment, FetchError>;
}

/// What to ask a source for, derived from the node being expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborhoodRequest {
    /// Dependencies of one concrete version.
    Version {
        /// Version identity (package URL with version)
        identity: String,
    },

    /// Packages declared by an uploaded requirement file.
    RequirementFile {
        /// Backend file identifier
        identity: String,
    },

    /// Versions of a package, narrowed by the constraint it was required with.
    Package {
        /// Package ecosystem
        ecosystem: NodeKind,
        /// Package identity (package URL)
        identity: String,
        /// Version constraint from the inbound `requires` edge
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraints: Option<String>,
    },
}

impl NeighborhoodRequest {
    /// Build the request for expanding `node` within `graph`.
    ///
    /// Package nodes carry the constraint of the first inbound `requires`
    /// edge (lowest edge id) that has one; a node has at most one
    /// meaningful constraint.
    #[must_use]
    pub fn for_node(node: &GraphNode, graph: &Graph) -> Self {
        match node.kind {
            NodeKind::Version => Self::Version {
                identity: node_identity(node, PURL_PROP),
            },
            NodeKind::RequirementFile => Self::RequirementFile {
                identity: node_identity(node, FILE_ID_PROP),
            },
            ecosystem => Self::Package {
                ecosystem,
                identity: node_identity(node, PURL_PROP),
                constraints: graph
                    .inbound(&node.id, EdgeKind::Requires)
                    .find_map(GraphEdge::constraints)
                    .map(str::to_string),
            },
        }
    }

    /// The identity the request is keyed on.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::Version { identity }
            | Self::RequirementFile { identity }
            | Self::Package { identity, .. } => identity,
        }
    }

    /// The version constraint, for package requests.
    #[must_use]
    pub fn constraints(&self) -> Option<&str> {
        match self {
            Self::Package { constraints, .. } => constraints.as_deref(),
            Self::Version { .. } | Self::RequirementFile { .. } => None,
        }
    }
}

impl fmt::Display for NeighborhoodRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version { identity } => write!(f, "version {identity}"),
            Self::RequirementFile { identity } => write!(f, "requirement file {identity}"),
            Self::Package {
                ecosystem,
                identity,
                constraints: Some(constraints),
            } => write!(f, "{ecosystem} package {identity} ({constraints})"),
            Self::Package {
                ecosystem,
                identity,
                constraints: None,
            } => write!(f, "{ecosystem} package {identity}"),
        }
    }
}

fn node_identity(node: &GraphNode, prop: &str) -> String {
    node.prop_str(prop)
        .map_or_else(|| node.id.as_str().to_string(), str::to_string)
}

/// A validated fragment plus what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Entries that passed validation.
    pub fragment: Fragment,

    /// One entry per dropped node or edge.
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate a raw fragment.
///
/// Nodes without an id and edges without an id, source, or target are
/// dropped and logged. Untyped entries are kept as [`NodeKind::Other`] or
/// [`EdgeKind::Related`]. A node without a label is labelled with its id.
#[must_use]
pub fn normalize(raw: RawFragment) -> Normalized {
    let mut out = Normalized::default();

    for (index, node) in raw.nodes.into_iter().enumerate() {
        let Some(id) = node.id else {
            out.drop_entry(Diagnostic::MissingNodeId { index });
            continue;
        };
        let kind = node.kind.unwrap_or_else(|| {
            tracing::debug!(node = %id, "Untyped node");
            NodeKind::Other
        });
        out.fragment.nodes.push(GraphNode {
            label: node.label.unwrap_or_else(|| id.as_str().to_string()),
            id,
            kind,
            props: node.props,
        });
    }

    for (index, edge) in raw.edges.into_iter().enumerate() {
        let (id, source, target) = match (edge.id, edge.source, edge.target) {
            (Some(id), Some(source), Some(target)) => (id, source, target),
            (id, source, _) => {
                let field = if id.is_none() {
                    "id"
                } else if source.is_none() {
                    "source"
                } else {
                    "target"
                };
                out.drop_entry(Diagnostic::MissingEdgeField {
                    index,
                    edge_id: id,
                    field,
                });
                continue;
            }
        };
        let kind = edge.kind.unwrap_or_else(|| {
            tracing::debug!(edge = %id, "Untyped edge");
            EdgeKind::Related
        });
        out.fragment.edges.push(GraphEdge {
            id,
            source,
            target,
            kind,
            props: edge.props,
        });
    }

    out
}

impl Normalized {
    fn drop_entry(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EdgeId, NodeId, RawEdge, RawNode};
    use crate::merge::{EdgeMap, NodeMap, merge_edges, merge_nodes};
    use rstest::rstest;

    fn raw_node(id: Option<&str>, kind: Option<NodeKind>) -> RawNode {
        RawNode {
            id: id.map(NodeId::new),
            label: None,
            kind,
            props: Default::default(),
        }
    }

    fn graph_with(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Graph {
        let merged = merge_nodes(&NodeMap::new(), &nodes);
        let merged_edges = merge_edges(&EdgeMap::new(), &edges, &merged.nodes);
        Graph::from_parts(merged.nodes, merged_edges.edges)
    }

    #[test]
    fn test_version_request_uses_purl() {
        let node = GraphNode::new("v1", "foo@1.0", NodeKind::Version)
            .with_prop(PURL_PROP, "pkg:npm/foo@1.0");
        let request = NeighborhoodRequest::for_node(&node, &Graph::seeded(node.clone()));
        assert_eq!(
            request,
            NeighborhoodRequest::Version {
                identity: "pkg:npm/foo@1.0".to_string()
            }
        );
    }

    #[test]
    fn test_requirement_file_request_uses_file_id() {
        let node = GraphNode::new("file-1", "requirements.txt", NodeKind::RequirementFile)
            .with_prop(FILE_ID_PROP, "42");
        let request = NeighborhoodRequest::for_node(&node, &Graph::seeded(node.clone()));
        assert_eq!(request.identity(), "42");
        assert_eq!(request.constraints(), None);
    }

    #[test]
    fn test_identity_falls_back_to_node_id() {
        let node = GraphNode::new("file-1", "requirements.txt", NodeKind::RequirementFile);
        let request = NeighborhoodRequest::for_node(&node, &Graph::seeded(node.clone()));
        assert_eq!(request.identity(), "file-1");
    }

    #[test]
    fn test_package_request_takes_first_inbound_constraint() {
        let parent = GraphNode::new("pkg:npm/app@1.0", "app@1.0", NodeKind::Version);
        let other = GraphNode::new("pkg:npm/tool@2.0", "tool@2.0", NodeKind::Version);
        let dep = GraphNode::new("pkg:npm/dep", "dep", NodeKind::Npm);
        let graph = graph_with(
            vec![parent, other, dep.clone()],
            vec![
                GraphEdge::new("e2", "pkg:npm/tool@2.0", "pkg:npm/dep", EdgeKind::Requires)
                    .with_constraints("~2.0"),
                GraphEdge::new("e1", "pkg:npm/app@1.0", "pkg:npm/dep", EdgeKind::Requires)
                    .with_constraints("^1.0"),
            ],
        );

        let request = NeighborhoodRequest::for_node(&dep, &graph);
        assert_eq!(
            request,
            NeighborhoodRequest::Package {
                ecosystem: NodeKind::Npm,
                identity: "pkg:npm/dep".to_string(),
                constraints: Some("^1.0".to_string()),
            }
        );
        assert_eq!(request.to_string(), "npm package pkg:npm/dep (^1.0)");
    }

    #[test]
    fn test_package_request_ignores_has_version_edges() {
        let dep = GraphNode::new("pkg:pypi/requests", "requests", NodeKind::Pypi);
        let other = GraphNode::new("x", "x", NodeKind::Pypi);
        let graph = graph_with(
            vec![dep.clone(), other],
            vec![
                GraphEdge::new("e1", "x", "pkg:pypi/requests", EdgeKind::HasVersion)
                    .with_constraints(">=2"),
            ],
        );
        assert_eq!(NeighborhoodRequest::for_node(&dep, &graph).constraints(), None);
    }

    #[test]
    fn test_normalize_drops_null_node_id() {
        let raw = RawFragment {
            nodes: vec![
                raw_node(Some("a"), Some(NodeKind::Npm)),
                raw_node(None, Some(NodeKind::Npm)),
                raw_node(Some("b"), Some(NodeKind::Npm)),
            ],
            edges: vec![],
        };

        let normalized = normalize(raw);
        assert_eq!(normalized.fragment.nodes.len(), 2);
        assert_eq!(normalized.fragment.nodes[0].label, "a");
        assert_eq!(normalized.diagnostics, vec![Diagnostic::MissingNodeId { index: 1 }]);
    }

    #[test]
    fn test_normalize_keeps_untyped_entries() {
        let normalized = normalize(RawFragment {
            nodes: vec![raw_node(Some("pkg:foo@1.0"), None)],
            edges: vec![RawEdge {
                id: Some(EdgeId::new("e1")),
                source: Some(NodeId::new("pkg:foo")),
                target: Some(NodeId::new("pkg:foo@1.0")),
                ..RawEdge::default()
            }],
        });

        assert!(normalized.diagnostics.is_empty());
        assert_eq!(normalized.fragment.nodes[0].kind, NodeKind::Other);
        assert_eq!(normalized.fragment.edges[0].kind, EdgeKind::Related);
    }

    #[test]
    fn test_untyped_node_expands_by_package_identity() {
        let node = GraphNode::new("pkg:foo", "foo", NodeKind::Other);
        let request = NeighborhoodRequest::for_node(&node, &Graph::seeded(node.clone()));
        assert_eq!(
            request,
            NeighborhoodRequest::Package {
                ecosystem: NodeKind::Other,
                identity: "pkg:foo".to_string(),
                constraints: None,
            }
        );
    }

    #[rstest]
    #[case::id(None, Some("a"), Some("b"), "id")]
    #[case::source(Some("e1"), None, Some("b"), "source")]
    #[case::target(Some("e1"), Some("a"), None, "target")]
    fn test_normalize_drops_incomplete_edge(
        #[case] id: Option<&str>,
        #[case] source: Option<&str>,
        #[case] target: Option<&str>,
        #[case] field: &str,
    ) {
        let raw = RawFragment {
            nodes: vec![],
            edges: vec![RawEdge {
                id: id.map(EdgeId::new),
                source: source.map(NodeId::new),
                target: target.map(NodeId::new),
                kind: Some(EdgeKind::Requires),
                props: Default::default(),
            }],
        };

        let normalized = normalize(raw);
        assert!(normalized.fragment.edges.is_empty());
        match &normalized.diagnostics[..] {
            [Diagnostic::MissingEdgeField { field: got, .. }] => assert_eq!(*got, field),
            other => panic!("unexpected diagnostics: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_keeps_valid_entries_beside_unknown_type() {
        let raw: RawFragment = serde_json::from_str(
            r#"{"nodes":[{"id":"x","type":"PyPIPackage"},{"id":"y","type":"npm"}],"edges":[]}"#,
        )
        .unwrap();

        let normalized = normalize(raw);
        let kinds: Vec<_> = normalized.fragment.nodes.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Other, NodeKind::Npm]);
        assert!(normalized.diagnostics.is_empty());
    }

    #[test]
    fn test_normalize_decodes_wire_json() {
        let raw: RawFragment = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "pkg:foo@1.0", "type": "version"},
                    {"id": null, "type": "version"}
                ],
                "edges": [
                    {"id": "e1", "source": "pkg:foo", "target": "pkg:foo@1.0", "type": "has_version"}
                ]
            }"#,
        )
        .unwrap();

        let normalized = normalize(raw);
        assert_eq!(normalized.fragment.nodes.len(), 1);
        assert_eq!(normalized.fragment.edges.len(), 1);
        assert_eq!(normalized.diagnostics.len(), 1);
    }
}
