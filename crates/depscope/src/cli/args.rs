//! CLI argument structs and value parsers.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::domain::{NodeKind, NodeId};

/// Arguments for the `explore` command
#[derive(Parser, Debug, Clone)]
pub struct ExploreArgs {
    /// Id of the seed node (e.g. "pkg:npm/express")
    #[arg(long, value_parser = validate_node_id)]
    pub seed: String,

    /// Kind of the seed node
    #[arg(long = "seed-type", value_enum, default_value = "npm")]
    pub seed_type: NodeKindArg,

    /// Neighborhood fixture (YAML, or JSON if it ends in .json)
    ///
    /// Overrides `fixture` from the configuration file.
    #[arg(long)]
    pub fixture: Option<PathBuf>,

    /// Configuration file (default: ./depscope.yaml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Levels to expand from the seed before applying steps
    ///
    /// Overrides `max_depth` from the configuration file. 0 leaves the
    /// seed unexpanded.
    #[arg(long)]
    pub depth: Option<usize>,

    /// Scripted step applied after the initial expansion, in order
    ///
    /// Format: "expand=<ID>" or "collapse=<ID>". May be repeated.
    #[arg(long = "step", value_parser = parse_step)]
    pub steps: Vec<Step>,
}

/// Node kind for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKindArg {
    /// npm package
    Npm,
    /// `PyPI` package
    Pypi,
    /// Maven artifact
    Maven,
    /// Cargo crate
    Cargo,
    /// Go module
    Golang,
    /// `NuGet` package
    Nuget,
    /// Concrete package version
    Version,
    /// Requirement file
    #[value(name = "requirement_file", alias = "requirement-file")]
    RequirementFile,
    /// Untyped package-like node
    Other,
}

impl From<NodeKindArg> for NodeKind {
    fn from(arg: NodeKindArg) -> Self {
        match arg {
            NodeKindArg::Npm => Self::Npm,
            NodeKindArg::Pypi => Self::Pypi,
            NodeKindArg::Maven => Self::Maven,
            NodeKindArg::Cargo => Self::Cargo,
            NodeKindArg::Golang => Self::Golang,
            NodeKindArg::Nuget => Self::Nuget,
            NodeKindArg::Version => Self::Version,
            NodeKindArg::RequirementFile => Self::RequirementFile,
            NodeKindArg::Other => Self::Other,
        }
    }
}

/// One scripted engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Expand the node
    Expand(NodeId),
    /// Collapse the node
    Collapse(NodeId),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expand(id) => write!(f, "expand={id}"),
            Self::Collapse(id) => write!(f, "collapse={id}"),
        }
    }
}

/// Validate a node id: non-empty after trimming.
pub fn validate_node_id(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Node ID cannot be empty".to_string());
    }
    Ok(trimmed.to_string())
}

/// Parse `expand=<ID>` or `collapse=<ID>`.
///
/// Splits on the first `=`, so ids may themselves contain `=`.
pub fn parse_step(s: &str) -> Result<Step, String> {
    let Some((op, id)) = s.split_once('=') else {
        return Err(format!(
            "Invalid step '{s}'. Expected 'expand=<ID>' or 'collapse=<ID>'"
        ));
    };
    let id = NodeId::new(validate_node_id(id)?);

    match op.trim().to_ascii_lowercase().as_str() {
        "expand" => Ok(Step::Expand(id)),
        "collapse" => Ok(Step::Collapse(id)),
        other => Err(format!(
            "Unknown step operation '{other}'. Expected 'expand' or 'collapse'"
        )),
    }
}
