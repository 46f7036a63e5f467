//! Structural edits over a loaded mind map.
//!
//! # Responsibility
//! - Create, update and delete topics while keeping tree invariants.
//! - Allocate fresh ids and GUIDs for new topics.
//! - Suggest advisory coordinates for new topics.
//!
//! # Invariants
//! - Every operation validates fully before touching the document.
//! - A failed operation leaves the document unchanged.
//!
//! # See also
//! - docs: `DESIGN.md` (mutation engine)

use crate::model::node::NodeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mutation;
pub mod placement;

pub use mutation::{create_node, delete_node, update_node, NodeUpdate};
pub use placement::place_child;

pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from tree lookups and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Referenced topic id is not in the document.
    NodeNotFound(NodeId),
    /// Request is structurally disallowed.
    InvalidOperation(String),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::InvalidOperation(reason) => write!(f, "invalid operation: {reason}"),
        }
    }
}

impl Error for TreeError {}
