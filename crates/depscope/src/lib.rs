//! Depscope - incremental dependency-graph materializer.
//!
//! A [`GraphEngine`](engine::GraphEngine) starts from one seed node and grows
//! the graph one neighborhood at a time through a
//! [`NeighborhoodSource`](fetcher::NeighborhoodSource). Collapsing a node
//! retracts everything its expansions introduced, transitively.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod graph;
pub mod merge;
pub mod tracker;

// Public CLI module (needed by binary)
pub mod cli;
pub mod config;
pub mod output;

pub use engine::{CollapseSummary, DepthExpansion, ExpandOutcome, GraphEngine};
pub use error::{Error, FetchError, Result};
