//! Color and styling helpers.
//!
//! Semantic theme:
//!   - Info/Reference: cyan    (node ids, root icon)
//!   - Warning:        yellow  (dropped entries, unexpanded nodes)
//!   - Error:          red     (failed expansions)
//!   - Success:        green   (expanded nodes)
//!   - Muted:          dimmed  (connectors, kinds, edge labels)

use crate::domain::NodeKind;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Colorize a node id (cyan).
pub(crate) fn node_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Apply dimmed style to text.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Kind tag such as `[npm]`, colored by whether the node is a package.
pub(crate) fn kind_tag(kind: NodeKind, config: &OutputConfig) -> String {
    let text = format!("[{kind}]");
    if !config.use_colors {
        return text;
    }
    if kind.is_package() {
        text.magenta().to_string()
    } else {
        text.dimmed().to_string()
    }
}

/// Icon showing whether a node's neighborhood has been fetched.
pub(crate) fn expansion_icon(fetched: bool, config: &OutputConfig) -> String {
    let icon = match (fetched, config.use_ascii) {
        (true, true) => "-",
        (true, false) => "▾",
        (false, true) => "+",
        (false, false) => "▸",
    };
    if fetched {
        success(icon, config)
    } else {
        warning(icon, config)
    }
}
