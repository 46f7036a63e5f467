//! Nested key-value export.

use crate::model::mindmap::MindMap;
use crate::model::node::{Node, NodeId, Position};
use crate::model::passthrough::{DocumentPassthrough, Passthrough};
use crate::search::snapshot::cross_links;
use crate::tree::{TreeError, TreeResult};
use serde::Serialize;

/// Deepest topic level (start topic = 0) the nested export accepts.
///
/// Nested values are built and serialized recursively; deeper trees are
/// refused instead of risking the stack. The outline export has no limit.
pub const MAX_STRUCTURED_DEPTH: usize = 256;

/// Export switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Attach preserved, unmodelled XML content to the output.
    pub include_passthrough: bool,
}

/// One topic with its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredNode<'a> {
    pub id: &'a NodeId,
    pub text: &'a str,
    pub notes: Option<&'a str>,
    pub parent_id: Option<&'a NodeId>,
    pub position: Position,
    pub guid: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub url_link: Option<&'a str>,
    pub cross_links: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passthrough: Option<&'a Passthrough>,
    pub children: Vec<StructuredNode<'a>>,
}

/// Exported document: title, size and the topic tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredMap<'a> {
    pub title: Option<&'a str>,
    /// Topics in the exported tree.
    pub total_nodes: usize,
    pub root: StructuredNode<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<&'a DocumentPassthrough>,
}

/// Builds the nested structure for the tree (or the subtree at `root`).
///
/// # Errors
/// - `TreeError::NodeNotFound` when `root` is given but not in the document.
/// - `TreeError::InvalidOperation` when the tree is deeper than
///   [`MAX_STRUCTURED_DEPTH`].
pub fn to_structured<'a>(
    map: &'a MindMap,
    root: Option<&NodeId>,
    options: ExportOptions,
) -> TreeResult<StructuredMap<'a>> {
    let start = root.unwrap_or(map.root_id());
    let start = map
        .get(start)
        .ok_or_else(|| TreeError::NodeNotFound(start.clone()))?;
    if map
        .walk_from(&start.id)
        .any(|(depth, _)| depth > MAX_STRUCTURED_DEPTH)
    {
        return Err(TreeError::InvalidOperation(format!(
            "tree below `{}` is deeper than {MAX_STRUCTURED_DEPTH} levels; use the outline export",
            start.id
        )));
    }

    let mut total_nodes = 0;
    let root = build(map, start, options, &mut total_nodes);
    Ok(StructuredMap {
        title: map.title(),
        total_nodes,
        root,
        document: options
            .include_passthrough
            .then(|| map.passthrough()),
    })
}

/// Pretty-printed JSON form of [`to_structured`].
pub fn to_json(map: &MindMap, root: Option<&NodeId>, options: ExportOptions) -> TreeResult<String> {
    let structured = to_structured(map, root, options)?;
    serde_json::to_string_pretty(&structured)
        .map_err(|err| TreeError::InvalidOperation(format!("json export failed: {err}")))
}

fn build<'a>(
    map: &'a MindMap,
    node: &'a Node,
    options: ExportOptions,
    total: &mut usize,
) -> StructuredNode<'a> {
    *total += 1;
    let children = node
        .children
        .iter()
        .filter_map(|id| map.get(id))
        .map(|child| build(map, child, options, total))
        .collect();
    let passthrough = &node.attributes.passthrough;
    StructuredNode {
        id: &node.id,
        text: &node.text,
        notes: node.notes.as_deref(),
        parent_id: node.parent_id.as_ref(),
        position: node.position,
        guid: node.attributes.guid.as_deref(),
        icon: node.attributes.icon.as_deref(),
        url_link: node.attributes.url_link.as_deref(),
        cross_links: cross_links(map, &node.id),
        passthrough: (options.include_passthrough && !passthrough.is_empty()).then_some(passthrough),
        children,
    }
}
