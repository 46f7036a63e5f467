//! `.smmx` file repository.

use super::{MindMapRepository, StoredMindMap};
use crate::archive::{open_archive, write_archive};
use crate::error::{EngineError, EngineResult};
use crate::format::{parse_mindmap, serialize_mindmap};
use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// Repository reading and writing SimpleMind ZIP archives on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveRepository;

impl ArchiveRepository {
    pub fn new() -> Self {
        Self
    }
}

impl MindMapRepository for ArchiveRepository {
    fn load(&self, path: &Path) -> EngineResult<StoredMindMap> {
        let started_at = Instant::now();
        let (payload, manifest) = open_archive(path)?;
        let map = match parse_mindmap(&payload) {
            Ok(map) => map,
            Err(err) => {
                error!(
                    "event=mindmap_load module=repo status=error error_code=malformed_document error={}",
                    err
                );
                return Err(EngineError::malformed(path, err));
            }
        };

        info!(
            "event=mindmap_load module=repo status=ok nodes={} relations={} images={} duration_ms={}",
            map.len(),
            map.relations().len(),
            manifest.has_images(),
            started_at.elapsed().as_millis()
        );
        Ok(StoredMindMap { map, manifest })
    }

    fn save(&self, path: &Path, stored: &StoredMindMap) -> EngineResult<()> {
        let payload =
            serialize_mindmap(&stored.map).map_err(|err| EngineError::malformed(path, err))?;
        write_archive(path, &payload, &stored.manifest)?;
        Ok(())
    }
}
