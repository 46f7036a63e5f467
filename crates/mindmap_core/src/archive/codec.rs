//! ZIP read/write for `.smmx` files.

use super::{ArchiveError, ArchiveResult, DOCUMENT_ENTRY};
use log::{debug, error, info};
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Compression applied to an entry on write.
///
/// Methods other than stored/deflated are re-written as deflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCompression {
    Stored,
    Deflated,
}

impl EntryCompression {
    fn from_zip(method: CompressionMethod) -> Self {
        match method {
            CompressionMethod::Stored => Self::Stored,
            _ => Self::Deflated,
        }
    }

    fn to_zip(self) -> CompressionMethod {
        match self {
            Self::Stored => CompressionMethod::Stored,
            Self::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// One auxiliary entry carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Uncompressed bytes.
    pub data: Vec<u8>,
    pub compression: EntryCompression,
    pub is_dir: bool,
    pub modified: Option<DateTime>,
    pub unix_mode: Option<u32>,
}

/// Everything in the container except the document payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveManifest {
    /// Auxiliary entries in container order.
    pub entries: Vec<ArchiveEntry>,
    /// Index among all entries where the document entry sits.
    pub document_slot: usize,
    pub document_compression: EntryCompression,
    pub document_modified: Option<DateTime>,
}

impl Default for ArchiveManifest {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            document_slot: 0,
            document_compression: EntryCompression::Deflated,
            document_modified: None,
        }
    }
}

impl ArchiveManifest {
    /// Names of auxiliary entries, in container order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Whether the container carries embedded images.
    pub fn has_images(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| !entry.is_dir && entry.name.starts_with("images/"))
    }
}

/// Reads the document payload and the manifest of every other entry.
///
/// # Errors
/// - `ArchiveError::Io` when the file cannot be opened or read.
/// - `ArchiveError::InvalidContainer` when the file is not a ZIP container.
/// - `ArchiveError::MissingDocumentEntry` when `document/mindmap.xml` is absent.
pub fn open_archive(path: &Path) -> ArchiveResult<(Vec<u8>, ArchiveManifest)> {
    let started_at = Instant::now();
    let file = File::open(path).map_err(|err| ArchiveError::io(path, err))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|err| map_zip_error(path, err))?;

    let mut payload = None;
    let mut manifest = ArchiveManifest::default();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| map_zip_error(path, err))?;
        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut data)
            .map_err(|err| ArchiveError::invalid(path, format!("entry `{}`: {err}", entry.name())))?;

        let compression = EntryCompression::from_zip(entry.compression());
        let modified: Option<DateTime> = entry.last_modified().into();
        if entry.name() == DOCUMENT_ENTRY && payload.is_none() {
            manifest.document_slot = index;
            manifest.document_compression = compression;
            manifest.document_modified = modified;
            payload = Some(data);
            continue;
        }

        manifest.entries.push(ArchiveEntry {
            name: entry.name().to_string(),
            data,
            compression,
            is_dir: entry.is_dir(),
            modified,
            unix_mode: entry.unix_mode(),
        });
    }

    let payload = payload.ok_or_else(|| ArchiveError::MissingDocumentEntry {
        path: path.to_path_buf(),
    })?;
    debug!(
        "event=archive_open module=archive status=ok entries={} payload_bytes={} duration_ms={}",
        manifest.entries.len() + 1,
        payload.len(),
        started_at.elapsed().as_millis()
    );
    Ok((payload, manifest))
}

/// Writes `payload` plus the manifest entries to `path` atomically.
///
/// The archive is assembled in a temp file next to `path` and renamed over
/// it only after the ZIP directory is complete and synced.
pub fn write_archive(path: &Path, payload: &[u8], manifest: &ArchiveManifest) -> ArchiveResult<()> {
    let started_at = Instant::now();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|err| ArchiveError::io(path, err))?;
    if let Err(err) = write_entries(temp.as_file_mut(), path, payload, manifest) {
        error!(
            "event=archive_write module=archive status=error error_code=zip_write_failed error={}",
            err
        );
        return Err(err);
    }
    temp.as_file()
        .sync_all()
        .map_err(|err| ArchiveError::io(path, err))?;
    inherit_permissions(&temp, path).map_err(|err| ArchiveError::io(path, err))?;
    temp.persist(path)
        .map_err(|err| ArchiveError::io(path, err.error))?;

    info!(
        "event=archive_write module=archive status=ok entries={} payload_bytes={} duration_ms={}",
        manifest.entries.len() + 1,
        payload.len(),
        started_at.elapsed().as_millis()
    );
    Ok(())
}

/// Gives `temp` the permissions of the file it is about to replace.
///
/// Temp files start owner-only; a missing destination keeps that mode.
pub(crate) fn inherit_permissions(temp: &NamedTempFile, path: &Path) -> io::Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) => temp.as_file().set_permissions(metadata.permissions()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn write_entries(
    file: &mut File,
    path: &Path,
    payload: &[u8],
    manifest: &ArchiveManifest,
) -> ArchiveResult<()> {
    let mut zip = ZipWriter::new(file);
    let document_slot = manifest.document_slot.min(manifest.entries.len());

    for index in 0..=manifest.entries.len() {
        if index == document_slot {
            let options = entry_options(manifest.document_compression, manifest.document_modified, None);
            zip.start_file(DOCUMENT_ENTRY, options)
                .map_err(|err| map_zip_error(path, err))?;
            zip.write_all(payload)
                .map_err(|err| ArchiveError::io(path, err))?;
        }

        let Some(entry) = manifest.entries.get(index) else {
            continue;
        };
        let options = entry_options(entry.compression, entry.modified, entry.unix_mode);
        if entry.is_dir {
            zip.add_directory(entry.name.clone(), options)
                .map_err(|err| map_zip_error(path, err))?;
        } else {
            zip.start_file(entry.name.clone(), options)
                .map_err(|err| map_zip_error(path, err))?;
            zip.write_all(&entry.data)
                .map_err(|err| ArchiveError::io(path, err))?;
        }
    }

    zip.finish().map_err(|err| map_zip_error(path, err))?;
    Ok(())
}

fn entry_options(
    compression: EntryCompression,
    modified: Option<DateTime>,
    unix_mode: Option<u32>,
) -> SimpleFileOptions {
    let mut options = SimpleFileOptions::default().compression_method(compression.to_zip());
    if let Some(modified) = modified {
        options = options.last_modified_time(modified);
    }
    if let Some(mode) = unix_mode {
        options = options.unix_permissions(mode);
    }
    options
}

fn map_zip_error(path: &Path, err: ZipError) -> ArchiveError {
    match err {
        ZipError::Io(source) => ArchiveError::io(path, source),
        other => ArchiveError::invalid(path, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_entry() -> ArchiveEntry {
        ArchiveEntry {
            name: "images/ab12.png".to_string(),
            data: vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3],
            compression: EntryCompression::Stored,
            is_dir: false,
            modified: None,
            unix_mode: None,
        }
    }

    #[test]
    fn write_then_open_keeps_auxiliary_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.smmx");
        let manifest = ArchiveManifest {
            entries: vec![image_entry()],
            document_slot: 0,
            ..ArchiveManifest::default()
        };

        write_archive(&path, b"<xml/>", &manifest).unwrap();
        let (payload, reopened) = open_archive(&path).unwrap();

        assert_eq!(payload, b"<xml/>");
        assert_eq!(reopened.document_slot, 0);
        assert_eq!(reopened.entries.len(), 1);
        assert_eq!(reopened.entries[0].name, "images/ab12.png");
        assert_eq!(reopened.entries[0].data, image_entry().data);
        assert_eq!(reopened.entries[0].compression, EntryCompression::Stored);
        assert!(reopened.has_images());
    }

    #[test]
    fn document_slot_survives_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.smmx");
        let manifest = ArchiveManifest {
            entries: vec![image_entry()],
            document_slot: 1,
            ..ArchiveManifest::default()
        };

        write_archive(&path, b"<a/>", &manifest).unwrap();
        let (_, reopened) = open_archive(&path).unwrap();
        assert_eq!(reopened.document_slot, 1);
        assert_eq!(reopened.entry_names().collect::<Vec<_>>(), vec!["images/ab12.png"]);
    }

    #[test]
    fn missing_document_entry_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.smmx");
        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("readme.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"hello").unwrap();
        zip.finish().unwrap();

        let err = open_archive(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingDocumentEntry { .. }));
    }

    #[test]
    fn non_zip_file_is_invalid_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.smmx");
        std::fs::write(&path, b"definitely not a zip").unwrap();

        let err = open_archive(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidContainer { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_archive(&dir.path().join("absent.smmx")).unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
        assert!(err.path().ends_with("absent.smmx"));
    }
}
