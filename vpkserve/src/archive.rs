//! Archive codec seam.
//!
//! The index builder and the resolver only ever talk to archives through
//! [`ArchiveCodec`] and [`ArchiveHandle`]. [`VpkCodec`] is the production
//! implementation; tests substitute in-memory codecs.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::vpk::{self, VpkArchive, VpkError};

/// Errors returned by an archive codec.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive could not be opened or its directory could not be parsed.
    #[error("failed to open archive {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    /// The archive opened, but the named entry could not be opened.
    #[error("failed to open entry '{entry}' in {}: {reason}", path.display())]
    Entry {
        path: PathBuf,
        entry: String,
        reason: String,
    },
}

/// How an archive stores its data, derived from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// `<stem>_dir.<ext>` directory file with numbered data parts.
    MultiPart,
    /// Self-contained archive file.
    SingleFile,
}

impl ArchiveKind {
    /// Classify a container path by the `_dir.<ext>` naming convention.
    pub fn from_path(path: &Path) -> Self {
        let is_dir_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(vpk::split_dir_name)
            .is_some();
        if is_dir_file {
            ArchiveKind::MultiPart
        } else {
            ArchiveKind::SingleFile
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::MultiPart => write!(f, "multi-part"),
            ArchiveKind::SingleFile => write!(f, "single-file"),
        }
    }
}

/// Filesystem location of an archive container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveLocation {
    path: PathBuf,
    kind: ArchiveKind,
}

impl ArchiveLocation {
    /// Create a location, classifying it by file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ArchiveKind::from_path(&path);
        Self { path, kind }
    }

    /// Path of the container (the directory file for multi-part archives).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage kind.
    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }
}

impl fmt::Display for ArchiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A listed archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry name inside the archive.
    pub filename: String,
    /// Entry name without its directory.
    pub basename: String,
}

impl ArchiveEntry {
    /// Create an entry, deriving the basename from the filename.
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let basename = filename
            .rsplit_once('/')
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| filename.clone());
        Self { filename, basename }
    }
}

/// An open archive.
///
/// Handles are never cached: every resolution opens a fresh handle and drops
/// it before returning.
pub trait ArchiveHandle: Send {
    /// All entries in the codec's native enumeration order.
    fn entries(&self) -> Vec<ArchiveEntry>;

    /// Open a stream over one entry. The stream owns whatever file handles it
    /// needs and releases them when dropped.
    fn open_entry(&self, filename: &str) -> Result<Box<dyn Read + Send>, ArchiveError>;
}

/// Opens archive containers.
pub trait ArchiveCodec: Send + Sync {
    /// Open the archive at `location`.
    fn open(&self, location: &ArchiveLocation) -> Result<Box<dyn ArchiveHandle>, ArchiveError>;
}

/// [`ArchiveCodec`] for Valve VPK archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct VpkCodec;

impl ArchiveCodec for VpkCodec {
    fn open(&self, location: &ArchiveLocation) -> Result<Box<dyn ArchiveHandle>, ArchiveError> {
        let archive = match location.kind() {
            ArchiveKind::MultiPart => VpkArchive::open_dir(location.path()),
            ArchiveKind::SingleFile => VpkArchive::open_single(location.path()),
        }
        .map_err(|e| ArchiveError::Open {
            path: location.path().to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(VpkHandle(archive)))
    }
}

struct VpkHandle(VpkArchive);

impl ArchiveHandle for VpkHandle {
    fn entries(&self) -> Vec<ArchiveEntry> {
        self.0
            .entries()
            .iter()
            .map(|e| ArchiveEntry {
                filename: e.filename.clone(),
                basename: e.basename().to_string(),
            })
            .collect()
    }

    fn open_entry(&self, filename: &str) -> Result<Box<dyn Read + Send>, ArchiveError> {
        self.0
            .open(filename)
            .map(|reader| Box::new(reader) as Box<dyn Read + Send>)
            .map_err(|e: VpkError| ArchiveError::Entry {
                path: self.0.path().to_path_buf(),
                entry: filename.to_string(),
                reason: e.to_string(),
            })
    }
}
