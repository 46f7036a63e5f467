//! Mind map domain model.
//!
//! # Responsibility
//! - Define the canonical in-memory document: topic arena, id index,
//!   cross-links and preserved unmanaged XML.
//!
//! # Invariants
//! - Tree edges are stored as id references only; the arena owns every node.
//! - Content the engine does not interpret is carried in explicit passthrough
//!   fields, never dropped.

pub mod mindmap;
pub mod node;
pub mod passthrough;
