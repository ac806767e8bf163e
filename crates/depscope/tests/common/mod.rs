//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use depscope::domain::{EdgeKind, GraphEdge, GraphNode, NodeId, NodeKind, RawFragment, RawNode};
use depscope::fetcher::{NeighborhoodRequest, NeighborhoodSource};
use depscope::{FetchError, GraphEngine};
use tokio::sync::Notify;

/// Neighborhood source answering from a per-identity script.
///
/// Identities without a scripted response fail with `FetchError::NotFound`.
/// A held identity blocks its next fetch until released.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, Result<RawFragment, FetchError>>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    requests: Mutex<Vec<NeighborhoodRequest>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `identity` with `fragment` from now on.
    pub fn respond(&self, identity: &str, fragment: impl Into<RawFragment>) {
        self.responses
            .lock()
            .unwrap()
            .insert(identity.to_string(), Ok(fragment.into()));
    }

    /// Fail `identity` with `error` from now on.
    pub fn fail(&self, identity: &str, error: FetchError) {
        self.responses
            .lock()
            .unwrap()
            .insert(identity.to_string(), Err(error));
    }

    /// Block the next fetch of `identity` until the returned handle is
    /// notified.
    pub fn hold(&self, identity: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(identity.to_string(), Arc::clone(&notify));
        notify
    }

    /// Number of fetches started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<NeighborhoodRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NeighborhoodSource for ScriptedSource {
    async fn fetch(&self, request: &NeighborhoodRequest) -> Result<RawFragment, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let hold = self.holds.lock().unwrap().remove(request.identity());
        if let Some(hold) = hold {
            hold.notified().await;
        }
        tokio::task::yield_now().await;

        self.responses
            .lock()
            .unwrap()
            .get(request.identity())
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(request.to_string())))
    }
}

// ========== Builders ==========

pub fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

pub fn npm(id: &str) -> GraphNode {
    GraphNode::new(id, id, NodeKind::Npm)
}

pub fn version(id: &str) -> GraphNode {
    GraphNode::new(id, id, NodeKind::Version)
}

pub fn requires(edge: &str, source: &str, target: &str) -> GraphEdge {
    GraphEdge::new(edge, source, target, EdgeKind::Requires)
}

pub fn has_version(edge: &str, source: &str, target: &str) -> GraphEdge {
    GraphEdge::new(edge, source, target, EdgeKind::HasVersion)
}

/// A raw fragment built from well-formed nodes and edges.
pub fn fragment(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> RawFragment {
    RawFragment {
        nodes: nodes.into_iter().map(RawNode::from).collect(),
        edges: edges.into_iter().map(Into::into).collect(),
    }
}

/// Engine seeded with npm node `seed` over `source`.
pub fn engine(source: &Arc<ScriptedSource>, seed: &str) -> GraphEngine {
    GraphEngine::new(Arc::clone(source) as Arc<dyn NeighborhoodSource>, npm(seed))
}

/// Script the chain a -> b -> c -> d, each node introducing the next.
pub fn script_chain(source: &ScriptedSource) {
    for (from, to, edge) in [("a", "b", "e1"), ("b", "c", "e2"), ("c", "d", "e3")] {
        source.respond(from, fragment(vec![npm(to)], vec![requires(edge, from, to)]));
    }
}

/// Yield until `engine` reports `node` as loading.
pub async fn until_loading(engine: &GraphEngine, node: &NodeId) {
    while !engine.is_loading(node) {
        tokio::task::yield_now().await;
    }
}

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
