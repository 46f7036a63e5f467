//! Search, path and completeness queries.

use crate::model::mindmap::MindMap;
use crate::model::node::{Node, NodeId};
use crate::tree::{TreeError, TreeResult};
use serde::{Deserialize, Serialize};

/// Separator used when rendering a path as one line.
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// Topic fields a search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFields {
    Text,
    Notes,
    #[default]
    Both,
}

impl SearchFields {
    /// Maps the `search_notes` flag of the operation surface.
    pub fn from_search_notes(search_notes: bool) -> Self {
        if search_notes {
            Self::Both
        } else {
            Self::Text
        }
    }

    fn includes_text(self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }

    fn includes_notes(self) -> bool {
        matches!(self, Self::Notes | Self::Both)
    }
}

/// Case-insensitive substring search in pre-order.
///
/// The returned iterator is lazy; a blank query yields nothing.
pub fn search<'a>(
    map: &'a MindMap,
    query: &str,
    fields: SearchFields,
) -> impl Iterator<Item = &'a Node> + 'a {
    let needle = query.to_lowercase();
    let walk = if query.trim().is_empty() {
        None
    } else {
        Some(map.nodes())
    };
    walk.into_iter()
        .flatten()
        .map(|(_, node)| node)
        .filter(move |node| matches_node(node, &needle, fields))
}

fn matches_node(node: &Node, needle: &str, fields: SearchFields) -> bool {
    if fields.includes_text() && node.text.to_lowercase().contains(needle) {
        return true;
    }
    fields.includes_notes()
        && node
            .notes
            .as_deref()
            .is_some_and(|notes| notes.to_lowercase().contains(needle))
}

/// Topics from the root down to `id`, both inclusive.
///
/// # Errors
/// - `TreeError::NodeNotFound` when `id` is not in the document.
pub fn path<'a>(map: &'a MindMap, id: &NodeId) -> TreeResult<Vec<&'a Node>> {
    let mut current = map
        .get(id)
        .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    let mut chain = vec![current];
    while let Some(parent_id) = &current.parent_id {
        if chain.len() > map.len() {
            return Err(TreeError::InvalidOperation(format!(
                "parent chain of `{id}` does not reach the root"
            )));
        }
        current = map
            .get(parent_id)
            .ok_or_else(|| TreeError::NodeNotFound(parent_id.clone()))?;
        chain.push(current);
    }
    chain.reverse();
    Ok(chain)
}

/// Renders a path as `Root > Branch > Leaf`.
pub fn breadcrumb(path: &[&Node]) -> String {
    path.iter()
        .map(|node| node.text.as_str())
        .collect::<Vec<_>>()
        .join(BREADCRUMB_SEPARATOR)
}

/// Topics whose notes are absent or blank, root included, in pre-order.
pub fn without_notes(map: &MindMap) -> impl Iterator<Item = &Node> + '_ {
    map.nodes()
        .map(|(_, node)| node)
        .filter(|node| !node.has_notes())
}
