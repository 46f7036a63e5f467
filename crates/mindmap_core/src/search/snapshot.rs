//! Serializable views of topics and documents.

use crate::model::mindmap::MindMap;
use crate::model::node::{Node, NodeId, Position};
use crate::tree::{TreeError, TreeResult};
use serde::{Deserialize, Serialize};

/// Id and label of a direct child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub id: NodeId,
    pub text: String,
}

/// One topic with its direct children, detached from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub text: String,
    pub notes: Option<String>,
    pub position: Position,
    pub guid: Option<String>,
    pub icon: Option<String>,
    pub url_link: Option<String>,
    /// Ids on the other end of cross-links touching this topic.
    pub cross_links: Vec<NodeId>,
    pub children: Vec<ChildSummary>,
}

impl NodeSnapshot {
    fn capture(map: &MindMap, node: &Node) -> Self {
        let children = node
            .children
            .iter()
            .filter_map(|child_id| map.get(child_id))
            .map(|child| ChildSummary {
                id: child.id.clone(),
                text: child.text.clone(),
            })
            .collect();
        Self {
            id: node.id.clone(),
            parent_id: node.parent_id.clone(),
            text: node.text.clone(),
            notes: node.notes.clone(),
            position: node.position,
            guid: node.attributes.guid.clone(),
            icon: node.attributes.icon.clone(),
            url_link: node.attributes.url_link.clone(),
            cross_links: cross_links(map, &node.id),
            children,
        }
    }
}

/// Snapshot of one topic.
///
/// # Errors
/// - `TreeError::NodeNotFound` when `id` is not in the document.
pub fn snapshot(map: &MindMap, id: &NodeId) -> TreeResult<NodeSnapshot> {
    let node = map
        .get(id)
        .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    Ok(NodeSnapshot::capture(map, node))
}

/// Peer ids of every cross-link touching `id`, in document order.
pub(crate) fn cross_links(map: &MindMap, id: &NodeId) -> Vec<NodeId> {
    map.relations_of(id)
        .map(|relation| {
            if &relation.source == id {
                relation.target.clone()
            } else {
                relation.source.clone()
            }
        })
        .collect()
}

/// First-level branch of the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    pub id: NodeId,
    pub text: String,
    pub child_count: usize,
    /// Topics in the branch, the branch topic included.
    pub subtree_size: usize,
}

/// Overview of a whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSummary {
    pub title: Option<String>,
    pub total_nodes: usize,
    pub root_id: NodeId,
    pub root_text: String,
    pub nodes_without_notes: usize,
    pub relation_count: usize,
    pub branches: Vec<BranchSummary>,
}

pub fn summary(map: &MindMap) -> MapSummary {
    let root = map.root();
    let branches = root
        .children
        .iter()
        .filter_map(|id| map.get(id))
        .map(|branch| BranchSummary {
            id: branch.id.clone(),
            text: branch.text.clone(),
            child_count: branch.children.len(),
            subtree_size: map.walk_from(&branch.id).count(),
        })
        .collect();
    MapSummary {
        title: map.title().map(str::to_string),
        total_nodes: map.len(),
        root_id: root.id.clone(),
        root_text: root.text.clone(),
        nodes_without_notes: super::without_notes(map).count(),
        relation_count: map.relations().len(),
        branches,
    }
}
