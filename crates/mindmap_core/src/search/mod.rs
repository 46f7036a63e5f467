//! Read-only queries over a loaded mind map.
//!
//! # Responsibility
//! - Text search, ancestor paths and the missing-notes scan.
//! - Serializable snapshots of single topics and whole documents.
//!
//! # Invariants
//! - Queries never mutate the document.
//! - Results follow pre-order from the root, so repeated calls agree.

pub mod query;
pub mod snapshot;

pub use query::{breadcrumb, path, search, without_notes, SearchFields};
pub use snapshot::{snapshot, summary, BranchSummary, ChildSummary, MapSummary, NodeSnapshot};
