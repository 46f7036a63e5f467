//! Renderers for a document or one of its subtrees.
//!
//! # Responsibility
//! - Markdown outline for reading and sharing.
//! - Nested serde structure mirroring the topic model, for JSON output.
//!
//! # Invariants
//! - Pure functions of the tree; output order is pre-order from the start topic.
//! - Passthrough content stays out of exports unless asked for.

pub mod outline;
pub mod structured;

pub use outline::{clean_title, to_outline};
pub use structured::{
    to_json, to_structured, ExportOptions, StructuredMap, StructuredNode, MAX_STRUCTURED_DEPTH,
};
