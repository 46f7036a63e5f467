//! Mind map use-case service.
//!
//! # Responsibility
//! - Run queries under a per-path shared lock.
//! - Run load -> mutate -> save as one transaction under exclusive locks.
//! - Offer the engine operations as path-based calls for outer layers.
//!
//! # Invariants
//! - A failed transaction never writes; the target file keeps its content.
//! - Documents are saved only after tree invariants re-validate.

use super::lock::{with_exclusive, with_shared};
use crate::archive::inherit_permissions;
use crate::error::{EngineError, EngineResult};
use crate::export::{to_json, to_outline, ExportOptions};
use crate::model::mindmap::MindMap;
use crate::model::node::NodeId;
use crate::repo::{MindMapRepository, StoredMindMap};
use crate::tree::{create_node, delete_node, update_node, NodeUpdate};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Value produced by a committed transaction plus the file it wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    pub written_path: PathBuf,
}

/// Export renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }
}

/// Mind map service facade.
pub struct MindMapService<R: MindMapRepository> {
    repo: R,
}

impl<R: MindMapRepository> MindMapService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Loads the document at `path` and runs a read-only query on it.
    pub fn read<T>(
        &self,
        path: &Path,
        query: impl FnOnce(&StoredMindMap) -> EngineResult<T>,
    ) -> EngineResult<T> {
        with_shared(path, || {
            let stored = self.repo.load(path)?;
            query(&stored)
        })
    }

    /// Loads, edits and saves one document as a single transaction.
    ///
    /// The result is written to `output_path` when given, otherwise back to
    /// `path`. Nothing is written when `edit` fails.
    pub fn mutate<T>(
        &self,
        path: &Path,
        output_path: Option<&Path>,
        operation: &str,
        edit: impl FnOnce(&mut MindMap) -> EngineResult<T>,
    ) -> EngineResult<Committed<T>> {
        let target = output_path.unwrap_or(path);
        let started_at = Instant::now();
        info!(
            "event=mindmap_mutate module=service status=start op={} path={} target={}",
            operation,
            path.display(),
            target.display()
        );

        let result: EngineResult<T> = with_exclusive(&[path, target], || {
            let mut stored = self.repo.load(path)?;
            let value = edit(&mut stored.map)?;
            stored
                .map
                .check_invariants()
                .map_err(|err| EngineError::InvalidOperation(err.to_string()))?;
            self.repo.save(target, &stored)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                info!(
                    "event=mindmap_mutate module=service status=ok op={} target={} duration_ms={}",
                    operation,
                    target.display(),
                    started_at.elapsed().as_millis()
                );
                Ok(Committed {
                    value,
                    written_path: target.to_path_buf(),
                })
            }
            Err(err) => {
                error!(
                    "event=mindmap_mutate module=service status=error op={} error_code={} error={}",
                    operation,
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Adds a topic under `parent_id`; returns the new id.
    pub fn add_node(
        &self,
        path: &Path,
        output_path: Option<&Path>,
        parent_id: &NodeId,
        text: &str,
        notes: Option<String>,
    ) -> EngineResult<Committed<NodeId>> {
        self.mutate(path, output_path, "add_node", |map| {
            Ok(create_node(map, parent_id, text, notes)?)
        })
    }

    /// Partially updates one topic.
    pub fn update_node(
        &self,
        path: &Path,
        output_path: Option<&Path>,
        id: &NodeId,
        update: NodeUpdate,
    ) -> EngineResult<Committed<()>> {
        self.mutate(path, output_path, "update_node", |map| {
            Ok(update_node(map, id, update)?)
        })
    }

    /// Deletes a topic and its subtree; returns the removed ids.
    pub fn delete_node(
        &self,
        path: &Path,
        output_path: Option<&Path>,
        id: &NodeId,
    ) -> EngineResult<Committed<Vec<NodeId>>> {
        self.mutate(path, output_path, "delete_node", |map| {
            Ok(delete_node(map, id)?)
        })
    }

    /// Renders the document and optionally writes the rendering to `output_path`.
    pub fn export(
        &self,
        path: &Path,
        format: ExportFormat,
        output_path: Option<&Path>,
    ) -> EngineResult<String> {
        let content = self.read(path, |stored| {
            let rendered = match format {
                ExportFormat::Markdown => to_outline(&stored.map, None)?,
                ExportFormat::Json => to_json(&stored.map, None, ExportOptions::default())?,
            };
            Ok(rendered)
        })?;

        if let Some(output_path) = output_path {
            with_exclusive(&[output_path], || write_text_atomic(output_path, &content))?;
            info!(
                "event=mindmap_export module=service status=ok format={} target={} bytes={}",
                format.as_str(),
                output_path.display(),
                content.len()
            );
        }
        Ok(content)
    }
}

/// Writes `content` through a sibling temp file renamed over `path`.
fn write_text_atomic(path: &Path, content: &str) -> EngineResult<()> {
    let io_error = |source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.write_all(content.as_bytes()).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    inherit_permissions(&temp, path).map_err(io_error)?;
    temp.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}
