//! Markdown outline export.

use crate::model::mindmap::MindMap;
use crate::model::node::NodeId;
use crate::tree::{TreeError, TreeResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Deepest level rendered as a heading (`######`); deeper topics become bullets.
const MAX_HEADING_DEPTH: usize = 5;

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\N").expect("valid line break regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Renders the tree (or the subtree at `root`) as a Markdown outline.
///
/// # Errors
/// - `TreeError::NodeNotFound` when `root` is given but not in the document.
pub fn to_outline(map: &MindMap, root: Option<&NodeId>) -> TreeResult<String> {
    let start = root.unwrap_or(map.root_id());
    if !map.contains(start) {
        return Err(TreeError::NodeNotFound(start.clone()));
    }

    let mut out = String::new();
    let mut in_list = false;
    for (depth, node) in map.walk_from(start) {
        let title = clean_title(&node.text);
        let notes = node.notes.as_deref().map(clean_notes).filter(|n| !n.is_empty());

        if depth <= MAX_HEADING_DEPTH {
            if in_list {
                out.push('\n');
                in_list = false;
            }
            out.push_str(&"#".repeat(depth + 1));
            out.push(' ');
            out.push_str(&title);
            out.push_str("\n\n");
            if let Some(notes) = notes {
                out.push_str(&notes);
                out.push_str("\n\n");
            }
            continue;
        }

        in_list = true;
        let indent = "  ".repeat(depth - MAX_HEADING_DEPTH - 1);
        out.push_str(&indent);
        out.push_str("- ");
        out.push_str(&title);
        out.push('\n');
        if let Some(notes) = notes {
            for line in notes.lines() {
                out.push_str(&indent);
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    Ok(out)
}

/// Single-line topic title: `\N` markers and whitespace runs become one space.
pub fn clean_title(text: &str) -> String {
    let spaced = LINE_BREAK_RE.replace_all(text, " ");
    WHITESPACE_RE.replace_all(&spaced, " ").trim().to_string()
}

fn clean_notes(notes: &str) -> String {
    LINE_BREAK_RE.replace_all(notes, "\n").trim().to_string()
}
