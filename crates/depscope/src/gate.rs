//! Per-node fetch bookkeeping.
//!
//! The gate answers one question: may this node be expanded right now? A
//! node that is already fetched, or whose fetch is in flight, may not.
//!
//! Each in-flight fetch is identified by a [`LoadTicket`]. Clearing a node
//! (collapse, reset) invalidates its ticket, which is how the engine
//! recognizes results that arrive for a node nobody is waiting on anymore.

use crate::domain::NodeId;
use std::collections::HashMap;

/// Token for one in-flight expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    node: NodeId,
    serial: u64,
}

impl LoadTicket {
    /// The node this ticket was issued for.
    #[must_use]
    pub fn node(&self) -> &NodeId {
        &self.node
    }
}

/// Fetch state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Never expanded, collapsed, or last expansion failed.
    Unexpanded,

    /// Expansion in flight.
    Loading,

    /// Expansion completed and merged.
    Fetched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Loading(u64),
    Fetched,
}

/// Fetch gate for every node of one graph view.
///
/// Absent nodes are `Unexpanded`. All transitions are idempotent.
#[derive(Debug, Default)]
pub struct FetchGate {
    entries: HashMap<NodeId, Entry>,
    next_serial: u64,
}

impl FetchGate {
    /// Create an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the node is neither fetched nor loading.
    #[must_use]
    pub fn can_expand(&self, id: &NodeId) -> bool {
        !self.entries.contains_key(id)
    }

    /// Current state of `id`.
    #[must_use]
    pub fn state(&self, id: &NodeId) -> NodeState {
        match self.entries.get(id) {
            None => NodeState::Unexpanded,
            Some(Entry::Loading(_)) => NodeState::Loading,
            Some(Entry::Fetched) => NodeState::Fetched,
        }
    }

    /// Whether `id` has a fetch in flight.
    #[must_use]
    pub fn is_loading(&self, id: &NodeId) -> bool {
        self.state(id) == NodeState::Loading
    }

    /// Whether `id` has been expanded and merged.
    #[must_use]
    pub fn is_fetched(&self, id: &NodeId) -> bool {
        self.state(id) == NodeState::Fetched
    }

    /// Mark `id` as loading and return the ticket of its fetch.
    ///
    /// Calling this on a node that is already loading returns the existing
    /// ticket. A fetched node moves back to loading.
    pub fn begin_loading(&mut self, id: &NodeId) -> LoadTicket {
        if let Some(Entry::Loading(serial)) = self.entries.get(id) {
            return LoadTicket {
                node: id.clone(),
                serial: *serial,
            };
        }

        self.next_serial += 1;
        let serial = self.next_serial;
        self.entries.insert(id.clone(), Entry::Loading(serial));
        LoadTicket {
            node: id.clone(),
            serial,
        }
    }

    /// Clear the loading flag of `id`, whichever fetch set it.
    pub fn end_loading(&mut self, id: &NodeId) {
        if let Some(Entry::Loading(_)) = self.entries.get(id) {
            self.entries.remove(id);
        }
    }

    /// Whether `ticket` still identifies the current fetch of its node.
    #[must_use]
    pub fn holds(&self, ticket: &LoadTicket) -> bool {
        self.entries.get(&ticket.node) == Some(&Entry::Loading(ticket.serial))
    }

    /// Clear the loading flag only if `ticket` is still current.
    ///
    /// Returns `true` if the flag was cleared.
    pub fn finish(&mut self, ticket: &LoadTicket) -> bool {
        if self.holds(ticket) {
            self.entries.remove(&ticket.node);
            true
        } else {
            false
        }
    }

    /// Mark `id` as fetched. Clears any loading flag.
    pub fn mark_fetched(&mut self, id: &NodeId) {
        self.entries.insert(id.clone(), Entry::Fetched);
    }

    /// Mark `id` as not fetched. Leaves an in-flight fetch alone.
    pub fn mark_unfetched(&mut self, id: &NodeId) {
        if let Some(Entry::Fetched) = self.entries.get(id) {
            self.entries.remove(id);
        }
    }

    /// Return `id` to `Unexpanded`, invalidating any outstanding ticket.
    pub fn clear(&mut self, id: &NodeId) {
        self.entries.remove(id);
    }

    /// Return every node to `Unexpanded`.
    ///
    /// Serials keep counting, so tickets issued before the call stay stale.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}
