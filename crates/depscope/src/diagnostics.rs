//! Non-fatal diagnostics produced while absorbing fragment data.
//!
//! A neighborhood source may send entries with missing ids, edges missing
//! an endpoint, or edges pointing at nodes that never arrived. Those entries are
//! dropped one by one and each drop is described by a [`Diagnostic`], so the
//! rest of the fragment still merges.
//!
//! # Examples
//!
//! ```
//! use depscope::diagnostics::Diagnostic;
//!
//! let diagnostic = Diagnostic::MissingNodeId { index: 3 };
//! assert_eq!(diagnostic.kind(), "missing_node_id");
//! assert!(diagnostic.description().contains("node #3"));
//! ```

use crate::domain::{EdgeId, NodeId};

/// A dropped fragment entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A node arrived without an id.
    MissingNodeId {
        /// Position of the node within the fragment.
        index: usize,
    },

    /// An edge arrived without one of its identity fields.
    MissingEdgeField {
        /// Position of the edge within the fragment.
        index: usize,
        /// The edge's id, when that is not the missing field.
        edge_id: Option<EdgeId>,
        /// Name of the missing field (`id`, `source` or `target`).
        field: &'static str,
    },

    /// An edge referenced a node absent from the graph after the merge.
    DanglingEdge {
        /// The dropped edge.
        edge_id: EdgeId,
        /// The endpoint that could not be resolved.
        endpoint: NodeId,
    },
}

impl Diagnostic {
    /// Returns a human-readable description of the diagnostic.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MissingNodeId { index } => format!("node #{index}: missing id, dropped"),
            Self::MissingEdgeField {
                index,
                edge_id: Some(edge_id),
                field,
            } => format!("edge #{index} ({edge_id}): missing {field}, dropped"),
            Self::MissingEdgeField {
                index,
                edge_id: None,
                field,
            } => format!("edge #{index}: missing {field}, dropped"),
            Self::DanglingEdge { edge_id, endpoint } => {
                format!("edge {edge_id}: endpoint {endpoint} not in graph, dropped")
            }
        }
    }

    /// Returns a static string identifying the diagnostic kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingNodeId { .. } => "missing_node_id",
            Self::MissingEdgeField { .. } => "missing_edge_field",
            Self::DanglingEdge { .. } => "dangling_edge",
        }
    }

    /// Log this diagnostic at `warn` level.
    pub(crate) fn emit(&self) {
        tracing::warn!(kind = self.kind(), "{}", self.description());
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Diagnostic {}
