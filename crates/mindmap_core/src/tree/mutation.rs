//! Create, update and delete operations.

use super::placement::place_child;
use super::{TreeError, TreeResult};
use crate::model::mindmap::MindMap;
use crate::model::node::{normalize_notes, Node, NodeId};
use crate::model::passthrough::ManagedChild;
use std::collections::HashSet;
use uuid::Uuid;

/// Partial topic edit; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeUpdate {
    pub text: Option<String>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
}

impl NodeUpdate {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            notes: None,
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            text: None,
            notes: Some(notes.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.notes.is_none()
    }
}

/// Appends a new topic as the last child of `parent_id`.
///
/// Returns the freshly allocated id.
///
/// # Errors
/// - `TreeError::NodeNotFound` when `parent_id` is not in the document.
pub fn create_node(
    map: &mut MindMap,
    parent_id: &NodeId,
    text: impl Into<String>,
    notes: Option<String>,
) -> TreeResult<NodeId> {
    let parent = map
        .get(parent_id)
        .ok_or_else(|| TreeError::NodeNotFound(parent_id.clone()))?;
    let grandparent = parent
        .parent_id
        .as_ref()
        .and_then(|id| map.get(id))
        .map(|node| node.position);
    let position = place_child(parent.position, grandparent, parent.children.len());

    let id = map.allocate_id();
    let mut node = Node::new(id.clone(), Some(parent_id.clone()), text);
    node.position = position;
    node.notes = normalize_notes(notes);
    node.attributes.guid = Some(new_guid());
    if node.notes.is_some() {
        node.attributes
            .passthrough
            .ensure_managed_slot(ManagedChild::Notes);
    }

    map.get_mut(parent_id)
        .ok_or_else(|| TreeError::NodeNotFound(parent_id.clone()))?
        .children
        .push(id.clone());
    map.insert_node(node);
    Ok(id)
}

/// Applies a partial edit to one topic.
///
/// # Errors
/// - `TreeError::NodeNotFound` when `id` is not in the document.
/// - `TreeError::InvalidOperation` when the update carries no field.
pub fn update_node(map: &mut MindMap, id: &NodeId, update: NodeUpdate) -> TreeResult<()> {
    let node = map
        .get_mut(id)
        .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    if update.is_empty() {
        return Err(TreeError::InvalidOperation(
            "update needs text or notes".to_string(),
        ));
    }

    if let Some(text) = update.text {
        node.text = text;
    }
    if let Some(notes) = update.notes {
        node.notes = normalize_notes(Some(notes));
        let passthrough = &mut node.attributes.passthrough;
        if node.notes.is_some() {
            passthrough.ensure_managed_slot(ManagedChild::Notes);
        } else {
            passthrough.release_managed_slot(ManagedChild::Notes);
        }
    }
    Ok(())
}

/// Removes a topic with its whole subtree and every cross-link touching it.
///
/// Returns the removed ids, the target first, then descendants in pre-order.
///
/// # Errors
/// - `TreeError::NodeNotFound` when `id` is not in the document.
/// - `TreeError::InvalidOperation` when `id` is the root.
pub fn delete_node(map: &mut MindMap, id: &NodeId) -> TreeResult<Vec<NodeId>> {
    let node = map
        .get(id)
        .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    let Some(parent_id) = node.parent_id.clone() else {
        return Err(TreeError::InvalidOperation(
            "the root topic cannot be deleted".to_string(),
        ));
    };

    let removed = map.subtree_ids(id);
    let parent = map
        .get_mut(&parent_id)
        .ok_or_else(|| TreeError::NodeNotFound(parent_id.clone()))?;
    parent.children.retain(|child| child != id);

    for removed_id in &removed {
        map.remove_node(removed_id);
    }
    let gone: HashSet<&NodeId> = removed.iter().collect();
    map.retain_relations(|relation| {
        !gone.contains(&relation.source) && !gone.contains(&relation.target)
    });
    Ok(removed)
}

/// Fresh SimpleMind-style GUID: 32 uppercase hex digits.
pub(crate) fn new_guid() -> String {
    Uuid::new_v4().simple().to_string().to_ascii_uppercase()
}
