//! Mind map persistence contracts and implementations.
//!
//! # Responsibility
//! - Define how a document is loaded from and saved to a path.
//! - Keep ZIP and XML details behind the repository boundary.
//!
//! # Invariants
//! - `save` writes the auxiliary entries recorded at `load` unchanged.
//! - A failed `save` leaves the previous file content in place.

use crate::archive::ArchiveManifest;
use crate::error::EngineResult;
use crate::model::mindmap::MindMap;
use std::path::Path;

pub mod archive_repo;
pub mod memory_repo;

pub use archive_repo::ArchiveRepository;
pub use memory_repo::MemoryRepository;

/// Document plus the container state needed to write it back.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMindMap {
    pub map: MindMap,
    pub manifest: ArchiveManifest,
}

impl StoredMindMap {
    /// Wraps a document that has no container yet.
    pub fn new(map: MindMap) -> Self {
        Self {
            map,
            manifest: ArchiveManifest::default(),
        }
    }
}

/// Load/save contract used by the service layer.
pub trait MindMapRepository {
    /// Reads and parses the document stored at `path`.
    fn load(&self, path: &Path) -> EngineResult<StoredMindMap>;

    /// Serializes and stores `stored` at `path`, replacing what was there.
    fn save(&self, path: &Path, stored: &StoredMindMap) -> EngineResult<()>;
}
