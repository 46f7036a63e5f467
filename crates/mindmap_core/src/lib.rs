//! Document engine for SimpleMind `.smmx` mind maps.
//! This crate is the single source of truth for tree invariants and the
//! archive/XML round-trip.

pub mod archive;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod tree;

pub use archive::{ArchiveError, ArchiveManifest, DOCUMENT_ENTRY};
pub use error::{EngineError, EngineResult};
pub use export::{to_json, to_outline, to_structured, ExportOptions};
pub use format::{parse_mindmap, serialize_mindmap, FormatError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::mindmap::{MindMap, Relation, StructureError};
pub use model::node::{Node, NodeId, Position};
pub use repo::{ArchiveRepository, MemoryRepository, MindMapRepository, StoredMindMap};
pub use search::{
    breadcrumb, path, search, snapshot, summary, without_notes, MapSummary, NodeSnapshot,
    SearchFields,
};
pub use service::{Committed, ExportFormat, MindMapService};
pub use tree::{create_node, delete_node, update_node, NodeUpdate, TreeError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
