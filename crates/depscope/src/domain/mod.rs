//! Domain types for the dependency graph view.
//!
//! Validated types ([`GraphNode`], [`GraphEdge`], [`Fragment`]) are what the
//! engine stores. The `Raw*` types mirror what a neighborhood source sends
//! over the wire, where any identity field may be missing; they are
//! normalized at the fetcher boundary before reaching the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form attribute bag attached to nodes and edges.
pub type Props = BTreeMap<String, serde_json::Value>;

/// Edge property holding the version constraint of a `requires` edge.
pub const CONSTRAINTS_PROP: &str = "constraints";

/// Node property holding the package URL of a package or version node.
pub const PURL_PROP: &str = "purl";

/// Node property holding the backend identifier of a requirement file.
pub const FILE_ID_PROP: &str = "file_id";

/// Unique identifier for a node (a package URL or a backend-assigned id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an edge, independent of node ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of entity a node represents.
///
/// The kind decides how the node is expanded: package ecosystems are
/// expanded by package identity, versions by version identity, and
/// requirement files by their backend file id. A type tag this crate does
/// not know deserializes as [`NodeKind::Other`], which expands like a
/// package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// npm package
    Npm,

    /// Python package index
    Pypi,

    /// Maven artifact
    Maven,

    /// Rust crate
    Cargo,

    /// Go module
    Golang,

    /// NuGet package
    Nuget,

    /// A concrete version of a package
    Version,

    /// An uploaded requirement/manifest file
    RequirementFile,

    /// Untyped node, or a type tag not listed above
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Whether this kind is expanded by package identity.
    ///
    /// True for the package ecosystems and for [`NodeKind::Other`].
    #[must_use]
    pub fn is_package(self) -> bool {
        !matches!(self, Self::Version | Self::RequirementFile)
    }

    /// The serialized name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pypi => "pypi",
            Self::Maven => "maven",
            Self::Cargo => "cargo",
            Self::Golang => "golang",
            Self::Nuget => "nuget",
            Self::Version => "version",
            Self::RequirementFile => "requirement_file",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Source depends on target, optionally under a version constraint
    Requires,

    /// Source package has target version
    HasVersion,

    /// Untyped relationship, or a type tag not listed above
    #[serde(other)]
    Related,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requires => f.write_str("requires"),
            Self::HasVersion => f.write_str("has_version"),
            Self::Related => f.write_str("related"),
        }
    }
}

/// One entity in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable unique identifier
    pub id: NodeId,

    /// Display name, not used for identity
    pub label: String,

    /// Entity kind
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Kind-dependent attributes
    #[serde(default)]
    pub props: Props,
}

impl GraphNode {
    /// Create a node with no props.
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            props: Props::new(),
        }
    }

    /// Builder-style helper to attach a string prop.
    #[must_use]
    pub fn with_prop(mut self, key: &str, value: impl Into<String>) -> Self {
        self.props
            .insert(key.to_string(), serde_json::Value::String(value.into()));
        self
    }

    /// Look up a string-valued prop.
    #[must_use]
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(serde_json::Value::as_str)
    }

    /// Shallow-merge `incoming` into this node. Incoming fields win.
    pub fn absorb(&mut self, incoming: &GraphNode) {
        self.label.clone_from(&incoming.label);
        self.kind = incoming.kind;
        for (key, value) in &incoming.props {
            self.props.insert(key.clone(), value.clone());
        }
    }
}

/// Directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Stable unique identifier
    pub id: EdgeId,

    /// Source node id
    pub source: NodeId,

    /// Target node id
    pub target: NodeId,

    /// Relationship kind
    #[serde(rename = "type")]
    pub kind: EdgeKind,

    /// Relationship attributes
    #[serde(default, skip_serializing_if = "Props::is_empty")]
    pub props: Props,
}

impl GraphEdge {
    /// Create an edge with no props.
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            props: Props::new(),
        }
    }

    /// Builder-style helper to attach a version constraint.
    #[must_use]
    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.props.insert(
            CONSTRAINTS_PROP.to_string(),
            serde_json::Value::String(constraints.into()),
        );
        self
    }

    /// The version constraint carried by this edge, if any.
    #[must_use]
    pub fn constraints(&self) -> Option<&str> {
        self.props
            .get(CONSTRAINTS_PROP)
            .and_then(serde_json::Value::as_str)
    }

    /// Whether either endpoint is `id`.
    #[must_use]
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// Shallow-merge `incoming` into this edge. Incoming fields win.
    pub fn absorb(&mut self, incoming: &GraphEdge) {
        self.source.clone_from(&incoming.source);
        self.target.clone_from(&incoming.target);
        self.kind = incoming.kind;
        for (key, value) in &incoming.props {
            self.props.insert(key.clone(), value.clone());
        }
    }
}

/// A validated `{nodes, edges}` bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Nodes in the fragment
    pub nodes: Vec<GraphNode>,

    /// Edges in the fragment
    pub edges: Vec<GraphEdge>,
}

/// A node as sent by a neighborhood source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Identifier (may be missing in malformed data)
    #[serde(default)]
    pub id: Option<NodeId>,

    /// Display label (defaults to the id)
    #[serde(default)]
    pub label: Option<String>,

    /// Entity kind ([`NodeKind::Other`] when absent)
    #[serde(default, rename = "type")]
    pub kind: Option<NodeKind>,

    /// Attributes
    #[serde(default)]
    pub props: Props,
}

impl From<GraphNode> for RawNode {
    fn from(node: GraphNode) -> Self {
        Self {
            id: Some(node.id),
            label: Some(node.label),
            kind: Some(node.kind),
            props: node.props,
        }
    }
}

/// An edge as sent by a neighborhood source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    /// Identifier
    #[serde(default)]
    pub id: Option<EdgeId>,

    /// Source node id
    #[serde(default)]
    pub source: Option<NodeId>,

    /// Target node id
    #[serde(default)]
    pub target: Option<NodeId>,

    /// Relationship kind ([`EdgeKind::Related`] when absent)
    #[serde(default, rename = "type")]
    pub kind: Option<EdgeKind>,

    /// Attributes
    #[serde(default)]
    pub props: Props,
}

impl From<GraphEdge> for RawEdge {
    fn from(edge: GraphEdge) -> Self {
        Self {
            id: Some(edge.id),
            source: Some(edge.source),
            target: Some(edge.target),
            kind: Some(edge.kind),
            props: edge.props,
        }
    }
}

/// A fragment as sent by a neighborhood source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFragment {
    /// Raw nodes
    #[serde(default)]
    pub nodes: Vec<RawNode>,

    /// Raw edges
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl From<Fragment> for RawFragment {
    fn from(fragment: Fragment) -> Self {
        Self {
            nodes: fragment.nodes.into_iter().map(RawNode::from).collect(),
            edges: fragment.edges.into_iter().map(RawEdge::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::npm(NodeKind::Npm, true)]
    #[case::golang(NodeKind::Golang, true)]
    #[case::version(NodeKind::Version, false)]
    #[case::requirement_file(NodeKind::RequirementFile, false)]
    #[case::other(NodeKind::Other, true)]
    fn test_is_package(#[case] kind: NodeKind, #[case] expected: bool) {
        assert_eq!(kind.is_package(), expected);
    }

    #[test]
    fn test_node_kind_serde_name_matches_display() {
        let json = serde_json::to_string(&NodeKind::RequirementFile).unwrap();
        assert_eq!(json, "\"requirement_file\"");
        assert_eq!(NodeKind::RequirementFile.to_string(), "requirement_file");
    }

    #[test]
    fn test_raw_node_tolerates_null_id() {
        let raw: RawNode = serde_json::from_str(r#"{"id": null, "type": "npm"}"#).unwrap();
        assert!(raw.id.is_none());
        assert_eq!(raw.kind, Some(NodeKind::Npm));
    }

    #[test]
    fn test_unrecognized_type_keeps_sibling_entries() {
        let raw: RawFragment = serde_json::from_str(
            r#"{"nodes":[{"id":"x","type":"PyPIPackage"},{"id":"y","type":"npm"}],"edges":[]}"#,
        )
        .unwrap();

        assert_eq!(raw.nodes.len(), 2);
        assert_eq!(raw.nodes[0].kind, Some(NodeKind::Other));
        assert_eq!(raw.nodes[1].kind, Some(NodeKind::Npm));
    }

    #[test]
    fn test_unrecognized_edge_type_is_related() {
        let raw: RawEdge = serde_yaml::from_str(
            "id: e1\nsource: a\ntarget: b\ntype: dev_dependency_of\n",
        )
        .unwrap();
        assert_eq!(raw.kind, Some(EdgeKind::Related));
        assert_eq!(EdgeKind::Related.to_string(), "related");
    }

    #[test]
    fn test_node_absorb_incoming_wins() {
        let mut existing = GraphNode::new("pkg:npm/a", "a", NodeKind::Npm)
            .with_prop("purl", "pkg:npm/a")
            .with_prop("license", "MIT");
        let incoming = GraphNode::new("pkg:npm/a", "a (renamed)", NodeKind::Npm)
            .with_prop("license", "Apache-2.0");

        existing.absorb(&incoming);

        assert_eq!(existing.label, "a (renamed)");
        assert_eq!(existing.prop_str("license"), Some("Apache-2.0"));
        assert_eq!(existing.prop_str("purl"), Some("pkg:npm/a"));
    }

    #[test]
    fn test_edge_constraints_roundtrip_through_props() {
        let edge = GraphEdge::new("e1", "a", "b", EdgeKind::Requires).with_constraints("^1.2");
        assert_eq!(edge.constraints(), Some("^1.2"));
        assert!(edge.touches(&NodeId::new("b")));
        assert!(!edge.touches(&NodeId::new("c")));
    }
}
