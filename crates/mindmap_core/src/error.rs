//! Engine-wide error type.
//!
//! # Responsibility
//! - Fold layer errors (archive, format, tree) into five caller-facing kinds.
//! - Expose a stable `kind()` code for transport layers.
//!
//! # Invariants
//! - Every variant maps to exactly one kind code.
//! - Filesystem failures surface as `io_error` with the affected path.

use crate::archive::ArchiveError;
use crate::format::FormatError;
use crate::model::node::NodeId;
use crate::tree::TreeError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by repositories and the service facade.
#[derive(Debug)]
pub enum EngineError {
    /// Container is unreadable or lacks the document entry.
    Archive(ArchiveError),
    /// Payload violates the SimpleMind schema or tree invariants.
    MalformedDocument {
        path: Option<PathBuf>,
        source: FormatError,
    },
    /// Referenced topic id is absent.
    NodeNotFound(NodeId),
    /// Structurally disallowed request.
    InvalidOperation(String),
    /// Filesystem failure.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl EngineError {
    /// Stable machine-readable kind code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Archive(_) => "archive_error",
            Self::MalformedDocument { .. } => "malformed_document",
            Self::NodeNotFound(_) => "node_not_found",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::Io { .. } => "io_error",
        }
    }

    /// File the failure relates to, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Archive(err) => Some(err.path()),
            Self::MalformedDocument { path, .. } => path.as_deref(),
            Self::Io { path, .. } => Some(path),
            Self::NodeNotFound(_) | Self::InvalidOperation(_) => None,
        }
    }

    /// Offending topic id for `node_not_found`.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeNotFound(id) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn malformed(path: &Path, source: FormatError) -> Self {
        Self::MalformedDocument {
            path: Some(path.to_path_buf()),
            source,
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Archive(err) => write!(f, "{err}"),
            Self::MalformedDocument {
                path: Some(path),
                source,
            } => write!(f, "malformed mind map `{}`: {source}", path.display()),
            Self::MalformedDocument { path: None, source } => {
                write!(f, "malformed mind map: {source}")
            }
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::InvalidOperation(reason) => write!(f, "invalid operation: {reason}"),
            Self::Io { path, source } => write!(f, "I/O error on `{}`: {source}", path.display()),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Archive(err) => Some(err),
            Self::MalformedDocument { source, .. } => Some(source),
            Self::NodeNotFound(_) => None,
            Self::InvalidOperation(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ArchiveError> for EngineError {
    fn from(value: ArchiveError) -> Self {
        match value {
            ArchiveError::Io { path, source } => Self::Io { path, source },
            other => Self::Archive(other),
        }
    }
}

impl From<FormatError> for EngineError {
    fn from(value: FormatError) -> Self {
        Self::MalformedDocument {
            path: None,
            source: value,
        }
    }
}

impl From<TreeError> for EngineError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::NodeNotFound(id) => Self::NodeNotFound(id),
            TreeError::InvalidOperation(reason) => Self::InvalidOperation(reason),
        }
    }
}
