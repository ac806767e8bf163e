//! Output formatting for the CLI.
//!
//! Submodules:
//! - [`color`]: semantic color helpers
//! - [`tree`]: dependency tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::diagnostics::Diagnostic;
use crate::domain::NodeId;
use crate::error::Error;
use crate::graph::Graph;
use serde::Serialize;
use std::collections::HashSet;
use std::env;
use std::io::{self, Write};

pub use tree::write_tree;

// ============================================================================
// Output Configuration
// ============================================================================

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Settings that control text rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use ASCII-only connectors and icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an `OutputConfig` with explicit values.
    #[must_use]
    pub fn new(use_ascii: bool, use_colors: bool) -> Self {
        Self {
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` from environment variables.
    ///
    /// Reads:
    /// - `DEPSCOPE_ASCII`: "1" or "true" for ASCII-only output (default: false)
    /// - `NO_COLOR`: any value disables colors
    /// - `DEPSCOPE_COLOR`: "0" or "false" disables colors (default: true)
    #[must_use]
    pub fn from_env() -> Self {
        let use_ascii = parse_flag("DEPSCOPE_ASCII", env::var("DEPSCOPE_ASCII").ok());

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("DEPSCOPE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            use_colors: true,
        }
    }
}

fn parse_flag(name: &str, value: Option<String>) -> bool {
    match value.as_deref() {
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
        Some(v) => {
            tracing::warn!(
                env_var = name,
                value = %v,
                "Invalid value (expected '1', 'true', '0', or 'false'), using default"
            );
            false
        }
        None => false,
    }
}

// ============================================================================
// Exploration Report
// ============================================================================

/// Everything the `explore` command prints.
#[derive(Debug)]
pub struct Report<'a> {
    /// Final graph view.
    pub graph: &'a Graph,
    /// Root of the printed tree.
    pub root: &'a NodeId,
    /// Nodes whose neighborhood has been fetched.
    pub fetched: &'a HashSet<NodeId>,
    /// Every node added during the run, in order, including ones a later
    /// collapse removed.
    pub added: &'a [NodeId],
    /// Dropped fragment entries.
    pub diagnostics: &'a [Diagnostic],
    /// Expansions that failed.
    pub failures: &'a [(NodeId, Error)],
}

#[derive(Serialize)]
struct DiagnosticJson {
    kind: &'static str,
    description: String,
}

#[derive(Serialize)]
struct FailureJson<'a> {
    node: &'a NodeId,
    error: String,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    graph: &'a Graph,
    added: &'a [NodeId],
    diagnostics: Vec<DiagnosticJson>,
    failures: Vec<FailureJson<'a>>,
}

/// Print a report to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_report(report: &Report<'_>, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();
    write_report(&mut handle, report, mode, &config)
}

/// Write a report in the requested format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(
    w: &mut W,
    report: &Report<'_>,
    mode: OutputMode,
    config: &OutputConfig,
) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            write_tree(w, report.graph, report.root, report.fetched, config)?;
            writeln!(w)?;
            writeln!(
                w,
                "{} {}",
                color::bold("Added nodes:", config),
                report.added.len()
            )?;
            write_problems(w, report.diagnostics, report.failures, config)
        }
        OutputMode::Json => {
            let json = ReportJson {
                graph: report.graph,
                added: report.added,
                diagnostics: report
                    .diagnostics
                    .iter()
                    .map(|d| DiagnosticJson {
                        kind: d.kind(),
                        description: d.description(),
                    })
                    .collect(),
                failures: report
                    .failures
                    .iter()
                    .map(|(node, err)| FailureJson {
                        node,
                        error: err.to_string(),
                    })
                    .collect(),
            };
            let output = serde_json::to_string_pretty(&json).map_err(io::Error::other)?;
            writeln!(w, "{output}")
        }
    }
}

fn write_problems<W: Write>(
    w: &mut W,
    diagnostics: &[Diagnostic],
    failures: &[(NodeId, Error)],
    config: &OutputConfig,
) -> io::Result<()> {
    if !diagnostics.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} ({}):",
            color::bold("Dropped entries", config),
            diagnostics.len()
        )?;
        for diagnostic in diagnostics {
            writeln!(
                w,
                "  {} {}",
                color::warning(diagnostic.kind(), config),
                diagnostic.description()
            )?;
        }
    }

    if !failures.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} ({}):",
            color::bold("Failed expansions", config),
            failures.len()
        )?;
        for (node, err) in failures {
            writeln!(
                w,
                "  {} {}",
                color::node_id(node.as_str(), config),
                color::error(&err.to_string(), config)
            )?;
        }
    }

    Ok(())
}
