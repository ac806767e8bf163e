//! Dependency tree rendering for `depscope explore` output.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use colored::Colorize;

use super::OutputConfig;
use super::color::{dimmed, expansion_icon, kind_tag, node_id};
use crate::domain::{GraphNode, NodeId};
use crate::graph::{Graph, TreeEntry};

/// Write the dependencies reachable from `root` with ASCII/Unicode
/// connectors.
///
/// ```text
/// ◆ pkg:npm/express express [npm] ▾
/// ├── pkg:npm/express@4.19.2 4.19.2 [version] (has_version) ▾
/// │   └── pkg:npm/debug debug [npm] (requires) ▸
/// └── pkg:npm/express@5.0.0 5.0.0 [version] (has_version) ▸
/// ```
///
/// Each node is printed once, under the parent it was first reached from.
///
/// # Errors
///
/// Returns `io::ErrorKind::NotFound` if `root` is not in the graph, or any
/// error from the writer.
pub fn write_tree<W: Write>(
    w: &mut W,
    graph: &Graph,
    root: &NodeId,
    fetched: &HashSet<NodeId>,
    config: &OutputConfig,
) -> io::Result<()> {
    let entries = graph
        .dependency_tree(root, None)
        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;

    let root_icon = if config.use_ascii { "*" } else { "◆" };
    let root_icon = if config.use_colors {
        root_icon.cyan().bold().to_string()
    } else {
        root_icon.to_string()
    };
    let root_line = describe(graph.node(root), root, config);
    let icon = expansion_icon(fetched.contains(root), config);
    writeln!(w, "{root_icon} {root_line} {icon}")?;

    let mut children: HashMap<&NodeId, Vec<&TreeEntry>> = HashMap::new();
    for entry in &entries {
        children.entry(&entry.parent).or_default().push(entry);
    }

    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    // (entry, ancestor levels that still have siblings below, is last child)
    let mut stack: Vec<(&TreeEntry, Vec<bool>, bool)> = Vec::new();
    push_children(&mut stack, children.get(root), &[]);

    while let Some((entry, segments, is_last)) = stack.pop() {
        let mut prefix = String::new();
        for &has_more in &segments {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);

        let line = describe(graph.node(&entry.node), &entry.node, config);
        let edge = dimmed(&format!("({})", entry.edge), config);
        let icon = expansion_icon(fetched.contains(&entry.node), config);
        writeln!(w, "{prefix}{connector}{line} {edge} {icon}")?;

        let mut next = segments;
        next.push(!is_last);
        push_children(&mut stack, children.get(&entry.node), &next);
    }

    Ok(())
}

/// Push `entries` so they pop in their original order.
fn push_children<'a>(
    stack: &mut Vec<(&'a TreeEntry, Vec<bool>, bool)>,
    entries: Option<&Vec<&'a TreeEntry>>,
    segments: &[bool],
) {
    let Some(entries) = entries else {
        return;
    };
    for (i, entry) in entries.iter().enumerate().rev() {
        stack.push((*entry, segments.to_vec(), i + 1 == entries.len()));
    }
}

fn describe(node: Option<&GraphNode>, id: &NodeId, config: &OutputConfig) -> String {
    let mut text = node_id(id.as_str(), config);
    if let Some(node) = node {
        if node.label != id.as_str() {
            text.push(' ');
            text.push_str(&node.label);
        }
        text.push(' ');
        text.push_str(&kind_tag(node.kind, config));
    }
    text
}
