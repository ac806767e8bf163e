//! Error types for depscope operations.
//!
//! Two classes of failure exist. Fetch failures ([`FetchError`], wrapped in
//! [`Error::Fetch`]) are runtime conditions: the expansion did not happen,
//! the graph is unchanged, and the caller may retry. [`Error::NodeNotFound`]
//! is a precondition violation that means the caller and engine disagree
//! about what is in the graph.

use crate::domain::NodeId;
use std::io;
use thiserror::Error;

/// Failure reported by a neighborhood source.
///
/// Any variant means "expansion did not happen".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure (connection reset, aborted request).
    #[error("network error: {0}")]
    Network(String),

    /// The source has no neighborhood for the requested identity.
    #[error("neighborhood not found: {0}")]
    NotFound(String),

    /// The source answered with data that could not be decoded at all.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The source is temporarily unable to answer.
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// The error type for depscope operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The node is not present in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Fetching a node's neighborhood failed; the node was left unexpanded.
    #[error("Expansion of {node} failed: {source}")]
    Fetch {
        /// The node whose expansion failed.
        node: NodeId,
        /// The underlying source failure.
        #[source]
        source: FetchError,
    },

    /// Fixture file could not be parsed.
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error indicates a caller/engine desynchronization bug
    /// rather than a recoverable runtime condition.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NodeNotFound(_))
    }
}

/// A specialized Result type for depscope operations.
pub type Result<T> = std::result::Result<T, Error>;
