//! In-memory repository for tests and embedding.
//!
//! Documents are kept as serialized payloads so every load and save runs
//! through the same parser and writer as the file repository.

use super::{MindMapRepository, StoredMindMap};
use crate::archive::ArchiveManifest;
use crate::error::{EngineError, EngineResult};
use crate::format::{parse_mindmap, serialize_mindmap};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    files: Mutex<HashMap<PathBuf, (Vec<u8>, ArchiveManifest)>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw payload bytes at `path`, bypassing the writer.
    pub fn insert_payload(&self, path: impl Into<PathBuf>, payload: impl Into<Vec<u8>>) {
        self.files()
            .insert(path.into(), (payload.into(), ArchiveManifest::default()));
    }

    /// Serialized payload currently stored at `path`.
    pub fn payload(&self, path: &Path) -> Option<Vec<u8>> {
        self.files().get(path).map(|(payload, _)| payload.clone())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files().contains_key(path)
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, (Vec<u8>, ArchiveManifest)>> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MindMapRepository for MemoryRepository {
    fn load(&self, path: &Path) -> EngineResult<StoredMindMap> {
        let (payload, manifest) = self.files().get(path).cloned().ok_or_else(|| {
            EngineError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(ErrorKind::NotFound, "no such document"),
            }
        })?;
        let map = parse_mindmap(&payload).map_err(|err| EngineError::malformed(path, err))?;
        Ok(StoredMindMap { map, manifest })
    }

    fn save(&self, path: &Path, stored: &StoredMindMap) -> EngineResult<()> {
        let payload =
            serialize_mindmap(&stored.map).map_err(|err| EngineError::malformed(path, err))?;
        self.files()
            .insert(path.to_path_buf(), (payload, stored.manifest.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mindmap::MindMap;

    #[test]
    fn missing_document_is_io_error() {
        let repo = MemoryRepository::new();
        let err = repo.load(Path::new("nowhere.smmx")).unwrap_err();
        assert_eq!(err.kind(), "io_error");
    }

    #[test]
    fn save_goes_through_the_writer() {
        let repo = MemoryRepository::new();
        let path = Path::new("mem.smmx");
        repo.save(path, &StoredMindMap::new(MindMap::new("Hub"))).unwrap();

        let payload = String::from_utf8(repo.payload(path).unwrap()).unwrap();
        assert!(payload.contains("text=\"Hub\""));
        assert_eq!(repo.load(path).unwrap().map.root().text, "Hub");
    }
}
