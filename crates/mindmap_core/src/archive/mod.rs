//! `.smmx` container access.
//!
//! # Responsibility
//! - Unpack the ZIP container into the XML payload and an entry manifest.
//! - Repack a new payload next to the untouched auxiliary entries.
//!
//! # Invariants
//! - Auxiliary entries keep name, order, bytes, timestamp and mode.
//! - Writes never leave a partially written archive at the destination.
//! - Replacing an existing file keeps its permissions.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod codec;

pub(crate) use codec::inherit_permissions;
pub use codec::{open_archive, write_archive, ArchiveEntry, ArchiveManifest, EntryCompression};

/// Name of the entry holding the mind map payload.
pub const DOCUMENT_ENTRY: &str = "document/mindmap.xml";

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors from reading or writing the container.
#[derive(Debug)]
pub enum ArchiveError {
    /// Filesystem failure on the archive or its temp file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File is not a readable ZIP container.
    InvalidContainer { path: PathBuf, message: String },
    /// Container lacks `document/mindmap.xml`.
    MissingDocumentEntry { path: PathBuf },
}

impl ArchiveError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
            Self::InvalidContainer { path, .. } => path,
            Self::MissingDocumentEntry { path } => path,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(path: &Path, message: impl Display) -> Self {
        Self::InvalidContainer {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error on `{}`: {source}", path.display()),
            Self::InvalidContainer { path, message } => write!(
                f,
                "`{}` is not a valid mind map archive: {message}",
                path.display()
            ),
            Self::MissingDocumentEntry { path } => write!(
                f,
                "`{}` has no `{DOCUMENT_ENTRY}` entry",
                path.display()
            ),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidContainer { .. } => None,
            Self::MissingDocumentEntry { .. } => None,
        }
    }
}
