//! Command execution logic.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::args::{ExploreArgs, Step};
use crate::config::DepscopeConfig;
use crate::domain::{GraphNode, NodeId};
use crate::engine::{DepthExpansion, ExpandOutcome, GraphEngine};
use crate::fetcher::fixture::FixtureSource;
use crate::output::{self, OutputMode, Report};

/// Execute the explore command
pub async fn execute_explore(args: &ExploreArgs, output_mode: OutputMode) -> Result<()> {
    let config = DepscopeConfig::discover(args.config.as_deref()).await?;

    let fixture = args
        .fixture
        .clone()
        .or(config.fixture)
        .context("No fixture given. Pass --fixture or set `fixture` in depscope.yaml")?;
    let source = FixtureSource::load(&fixture)
        .await
        .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
    tracing::debug!(entries = source.len(), "Fixture ready");

    let seed = GraphNode::new(args.seed.as_str(), args.seed.as_str(), args.seed_type.into());
    let root = seed.id.clone();
    let engine = GraphEngine::new(Arc::new(source), seed);

    let depth = args.depth.unwrap_or(config.max_depth);
    let mut run = engine.expand_to_depth(&root, depth).await?;

    for step in &args.steps {
        apply_step(&engine, step, &mut run).await?;
    }

    let graph = engine.graph();
    let fetched: HashSet<NodeId> = graph
        .nodes()
        .keys()
        .filter(|id| engine.is_fetched(id))
        .cloned()
        .collect();

    // The seed is never introduced by an expansion, so no collapse removes it.
    output::print_report(
        &Report {
            graph: &graph,
            root: &root,
            fetched: &fetched,
            added: &run.added,
            diagnostics: &run.diagnostics,
            failures: &run.failures,
        },
        output_mode,
    )?;

    Ok(())
}

async fn apply_step(engine: &GraphEngine, step: &Step, run: &mut DepthExpansion) -> Result<()> {
    match step {
        Step::Expand(id) => match engine.expand(id).await {
            Ok(ExpandOutcome::Expanded { added, diagnostics }) => {
                tracing::info!(node = %id, added = added.len(), "Expanded");
                run.added.extend(added);
                run.diagnostics.extend(diagnostics);
            }
            Ok(outcome) => {
                tracing::info!(node = %id, ?outcome, "Nothing to expand");
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(node = %id, error = %e, "Expansion failed");
                run.failures.push((id.clone(), e));
            }
            Err(e) => return Err(e).with_context(|| format!("Step '{step}' failed")),
        },
        Step::Collapse(id) => {
            let summary = engine
                .collapse(id)
                .with_context(|| format!("Step '{step}' failed"))?;
            tracing::info!(
                node = %id,
                removed_nodes = summary.removed_nodes.len(),
                removed_edges = summary.removed_edges,
                "Collapsed"
            );
        }
    }
    Ok(())
}
