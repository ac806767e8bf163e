//! The graph engine: one materialized view of a dependency graph.
//!
//! The engine owns the canonical [`Graph`], the [`FetchGate`] and the
//! [`ExpansionTracker`], and exposes a narrow interface over them:
//! [`expand`](GraphEngine::expand), [`collapse`](GraphEngine::collapse),
//! [`reset`](GraphEngine::reset) and read-only observers.
//!
//! # Node lifecycle
//!
//! ```text
//! Unexpanded --expand--> Loading --success--> Fetched
//!     ^                     |                    |
//!     +------failure--------+                    |
//!     +-----------------collapse-----------------+
//! ```
//!
//! # Concurrency
//!
//! All state sits behind one `std::sync::Mutex` that is never held across
//! an `.await`. Structural mutations are therefore serialized; only the
//! neighborhood fetch suspends. While a node is loading the gate rejects a
//! second expansion of it, but other nodes can be expanded or collapsed.
//!
//! # Stale results
//!
//! A fetch can still be in flight when its node is collapsed, removed by an
//! ancestor's collapse, or the engine is reset. Those operations invalidate
//! the node's [`LoadTicket`]; when the stale result arrives it is discarded
//! instead of merged, so removed nodes are never resurrected.

use crate::diagnostics::Diagnostic;
use crate::domain::{GraphNode, NodeId};
use crate::error::{Error, Result};
use crate::fetcher::{NeighborhoodRequest, NeighborhoodSource, normalize};
use crate::gate::{FetchGate, LoadTicket, NodeState};
use crate::graph::Graph;
use crate::merge::{merge_edges, merge_nodes};
use crate::tracker::ExpansionTracker;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What an [`expand`](GraphEngine::expand) call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// The neighborhood was fetched and merged.
    Expanded {
        /// Node ids that were not in the graph before, in fragment order.
        added: Vec<NodeId>,
        /// Fragment entries that were dropped.
        diagnostics: Vec<Diagnostic>,
    },

    /// The node is already expanded; nothing was fetched.
    AlreadyFetched,

    /// An expansion of the node is already in flight; nothing was fetched.
    InFlight,

    /// The fetch completed after the node was collapsed, removed or reset;
    /// its result was thrown away.
    Discarded,
}

impl ExpandOutcome {
    /// Ids added to the graph by this call.
    #[must_use]
    pub fn added(&self) -> &[NodeId] {
        match self {
            Self::Expanded { added, .. } => added,
            Self::AlreadyFetched | Self::InFlight | Self::Discarded => &[],
        }
    }
}

/// What a [`collapse`](GraphEngine::collapse) call removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseSummary {
    /// Removed node ids, sorted.
    pub removed_nodes: Vec<NodeId>,

    /// Number of removed edges.
    pub removed_edges: usize,
}

/// Result of [`expand_to_depth`](GraphEngine::expand_to_depth).
#[derive(Debug, Default)]
pub struct DepthExpansion {
    /// Every node id added across all levels.
    pub added: Vec<NodeId>,

    /// Dropped fragment entries across all levels.
    pub diagnostics: Vec<Diagnostic>,

    /// Expansions that failed, with their errors.
    pub failures: Vec<(NodeId, Error)>,
}

struct EngineState {
    graph: Graph,
    gate: FetchGate,
    tracker: ExpansionTracker,
}

/// Incremental dependency-graph materializer.
pub struct GraphEngine {
    source: Arc<dyn NeighborhoodSource>,
    state: Mutex<EngineState>,
}

impl GraphEngine {
    /// Create an engine whose graph holds only `seed`.
    pub fn new(source: Arc<dyn NeighborhoodSource>, seed: GraphNode) -> Self {
        Self {
            source,
            state: Mutex::new(EngineState {
                graph: Graph::seeded(seed),
                gate: FetchGate::new(),
                tracker: ExpansionTracker::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // State is only mutated in short critical sections with no panicking
        // calls, so a poisoned lock still guards consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch and merge the immediate neighborhood of `id`.
    ///
    /// Returns without fetching if the node is already fetched or loading.
    ///
    /// # Errors
    ///
    /// - `Error::NodeNotFound` if `id` is not in the graph
    /// - `Error::Fetch` if the source failed; the node is left unexpanded
    ///   and the graph unchanged, so the call can be retried
    pub async fn expand(&self, id: &NodeId) -> Result<ExpandOutcome> {
        let (ticket, request) = {
            let mut state = self.lock();
            match state.gate.state(id) {
                NodeState::Loading => {
                    debug!(node = %id, "Expansion already in flight");
                    return Ok(ExpandOutcome::InFlight);
                }
                NodeState::Fetched => {
                    debug!(node = %id, "Node already expanded");
                    return Ok(ExpandOutcome::AlreadyFetched);
                }
                NodeState::Unexpanded => {}
            }

            let node = state
                .graph
                .node(id)
                .ok_or_else(|| Error::NodeNotFound(id.clone()))?;
            let request = NeighborhoodRequest::for_node(node, &state.graph);
            let ticket = state.gate.begin_loading(id);
            (ticket, request)
        };

        debug!(node = %id, request = %request, "Fetching neighborhood");
        let guard = LoadingGuard {
            engine: self,
            ticket,
            armed: true,
        };
        let fetched = self.source.fetch(&request).await;

        let mut state = self.lock();
        let ticket = guard.disarm();

        if !state.gate.holds(&ticket) {
            info!(node = %id, "Discarding neighborhood that arrived after the node was retracted");
            return Ok(ExpandOutcome::Discarded);
        }

        let raw = match fetched {
            Ok(raw) => raw,
            Err(source) => {
                state.gate.finish(&ticket);
                warn!(node = %id, error = %source, "Expansion failed");
                return Err(Error::Fetch {
                    node: id.clone(),
                    source,
                });
            }
        };

        let normalized = normalize(raw);
        let nodes = merge_nodes(state.graph.nodes(), &normalized.fragment.nodes);
        let edges = merge_edges(state.graph.edges(), &normalized.fragment.edges, &nodes.nodes);

        state.graph = Graph::from_parts(nodes.nodes, edges.edges);
        state.tracker.record_expansion(id, &nodes.added);
        state.gate.mark_fetched(id);

        let mut diagnostics = normalized.diagnostics;
        diagnostics.extend(edges.diagnostics);

        debug!(
            node = %id,
            added = nodes.added.len(),
            dropped = diagnostics.len(),
            "Expanded node"
        );
        Ok(ExpandOutcome::Expanded {
            added: nodes.added,
            diagnostics,
        })
    }

    /// Retract everything the expansions of `id` introduced, transitively.
    ///
    /// `id` stays in the graph but loses its outgoing edges and returns to
    /// `Unexpanded`. Removed nodes lose their fetch state and expansion
    /// records so they can be expanded fresh if they are reached again.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if `id` is not in the graph.
    pub fn collapse(&self, id: &NodeId) -> Result<CollapseSummary> {
        let mut state = self.lock();
        if !state.graph.contains_node(id) {
            return Err(Error::NodeNotFound(id.clone()));
        }

        let to_remove = state.tracker.collect_descendants(id);
        let removed_edges = state.graph.retract(id, &to_remove);

        for removed in &to_remove {
            state.gate.clear(removed);
            state.tracker.forget(removed);
        }
        state.tracker.forget(id);
        state.gate.clear(id);

        let mut removed_nodes: Vec<NodeId> = to_remove.into_iter().collect();
        removed_nodes.sort();

        debug!(
            node = %id,
            removed_nodes = removed_nodes.len(),
            removed_edges,
            "Collapsed node"
        );
        Ok(CollapseSummary {
            removed_nodes,
            removed_edges,
        })
    }

    /// Replace the whole view with a graph holding only `seed`.
    ///
    /// All fetch state and expansion records are dropped; fetches still in
    /// flight will be discarded when they complete.
    pub fn reset(&self, seed: GraphNode) {
        let mut state = self.lock();
        debug!(seed = %seed.id, "Resetting graph view");
        state.graph = Graph::seeded(seed);
        state.gate.clear_all();
        state.tracker.clear();
    }

    /// Expand `root` and then, level by level, every node the previous level
    /// added, down to `depth` levels.
    ///
    /// Failed expansions are collected in the result and do not stop the
    /// walk. Nodes that are already fetched or loading are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if `root` is not in the graph.
    pub async fn expand_to_depth(&self, root: &NodeId, depth: usize) -> Result<DepthExpansion> {
        if !self.lock().graph.contains_node(root) {
            return Err(Error::NodeNotFound(root.clone()));
        }

        let mut result = DepthExpansion::default();
        let mut frontier = VecDeque::from([(root.clone(), 0usize)]);

        while let Some((id, level)) = frontier.pop_front() {
            if level >= depth {
                continue;
            }
            match self.expand(&id).await {
                Ok(ExpandOutcome::Expanded { added, diagnostics }) => {
                    frontier.extend(added.iter().map(|child| (child.clone(), level + 1)));
                    result.added.extend(added);
                    result.diagnostics.extend(diagnostics);
                }
                Ok(_) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => result.failures.push((id, err)),
            }
        }

        Ok(result)
    }

    /// A snapshot of the current graph.
    #[must_use]
    pub fn graph(&self) -> Graph {
        self.lock().graph.clone()
    }

    /// Fetch state of `id`.
    #[must_use]
    pub fn node_state(&self, id: &NodeId) -> NodeState {
        self.lock().gate.state(id)
    }

    /// Whether `id` has been expanded.
    #[must_use]
    pub fn is_fetched(&self, id: &NodeId) -> bool {
        self.lock().gate.is_fetched(id)
    }

    /// Whether an expansion of `id` is in flight.
    #[must_use]
    pub fn is_loading(&self, id: &NodeId) -> bool {
        self.lock().gate.is_loading(id)
    }

    /// Node ids introduced by the expansion of `id`.
    #[must_use]
    pub fn introduced_by(&self, id: &NodeId) -> Vec<NodeId> {
        self.lock().tracker.introduced_by(id).to_vec()
    }
}

/// Clears a node's loading flag if the expansion future is dropped while
/// its fetch is pending.
struct LoadingGuard<'a> {
    engine: &'a GraphEngine,
    ticket: LoadTicket,
    armed: bool,
}

impl LoadingGuard<'_> {
    /// Hand the ticket back to the caller, who takes over cleanup.
    fn disarm(mut self) -> LoadTicket {
        self.armed = false;
        self.ticket.clone()
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.engine.lock().gate.finish(&self.ticket) {
            debug!(node = %self.ticket.node(), "Expansion abandoned; loading cleared");
        }
    }
}
