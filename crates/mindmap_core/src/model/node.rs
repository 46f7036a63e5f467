//! Topic node model.
//!
//! # Responsibility
//! - Define the canonical record for one mind map topic.
//! - Keep unmodelled topic content in an explicit passthrough bag.
//!
//! # Invariants
//! - `id` is unique within one document and never reused while the node lives.
//! - `parent_id == None` only for the document root.
//! - `children` order is display order and survives load/save.
//! - `notes` is never `Some("")`; empty notes are represented as `None`.

use crate::model::passthrough::Passthrough;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Serialized parent reference of the root topic.
pub const ROOT_PARENT_SENTINEL: &str = "-1";

/// Stable topic identifier as written in the `id` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Numeric value for ids written as plain non-negative integers.
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Advisory layout coordinates. Only finiteness is checked; the file
/// format cannot carry infinities or NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Interpreted optional topic attributes plus everything left unmodelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// SimpleMind topic GUID.
    pub guid: Option<String>,
    /// Icon reference (`icon` attribute).
    pub icon: Option<String>,
    /// External URL (`link@urllink`).
    pub url_link: Option<String>,
    /// Unmodelled attributes and child content, preserved verbatim.
    pub passthrough: Passthrough,
}

/// One topic in the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// `None` marks the root topic.
    pub parent_id: Option<NodeId>,
    pub text: String,
    pub notes: Option<String>,
    pub position: Position,
    pub attributes: NodeAttributes,
    pub children: Vec<NodeId>,
}

impl Node {
    /// Creates a detached node with no children and default attributes.
    pub fn new(id: NodeId, parent_id: Option<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            text: text.into(),
            notes: None,
            position: Position::default(),
            attributes: NodeAttributes::default(),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the topic carries long-form notes.
    pub fn has_notes(&self) -> bool {
        self.notes
            .as_deref()
            .is_some_and(|notes| !notes.trim().is_empty())
    }
}

/// Collapses empty notes to `None`.
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_notes, Node, NodeId};

    #[test]
    fn numeric_ids_parse() {
        assert_eq!(NodeId::from("42").as_number(), Some(42));
        assert_eq!(NodeId::from("a7").as_number(), None);
        assert_eq!(NodeId::from(7_u64).as_str(), "7");
    }

    #[test]
    fn whitespace_notes_count_as_missing() {
        let mut node = Node::new(NodeId::from("1"), None, "Root");
        assert!(!node.has_notes());
        node.notes = Some("  \n".to_string());
        assert!(!node.has_notes());
        node.notes = Some("body".to_string());
        assert!(node.has_notes());
    }

    #[test]
    fn empty_notes_normalize_to_none() {
        assert_eq!(normalize_notes(Some(String::new())), None);
        assert_eq!(normalize_notes(Some("x".to_string())).as_deref(), Some("x"));
    }
}
