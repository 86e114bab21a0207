//! Content resolution.
//!
//! Turns a collection alias plus a virtual path into the bytes of the
//! owning archive entry. The resolver holds only borrowed, read-only state:
//! every call opens the owning archive afresh and releases it before
//! returning, so concurrent calls never share a handle.

use std::io::Read;

use thiserror::Error;
use tracing::debug;

use crate::archive::{ArchiveCodec, ArchiveLocation};
use crate::collection::CollectionSummary;
use crate::index::{normalize_virtual_path, CollectionIndex, ContentIndex, VirtualFileEntry};

/// Errors returned by [`ContentResolver`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No collection is configured under the alias.
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    /// The collection does not index the path.
    #[error("unknown path '{path}' in collection '{collection}'")]
    UnknownPath { collection: String, path: String },

    /// The extension argument is empty.
    #[error("extension must not be empty")]
    InvalidExtension,

    /// The index lists the file but its bytes could not be read.
    #[error("failed to read '{path}' from {archive}: {reason}")]
    ReadFailure {
        path: String,
        archive: ArchiveLocation,
        reason: String,
    },
}

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Resolves virtual paths against a built [`ContentIndex`].
#[derive(Clone, Copy)]
pub struct ContentResolver<'a> {
    index: &'a ContentIndex,
    codec: &'a dyn ArchiveCodec,
}

impl<'a> ContentResolver<'a> {
    /// Create a resolver over `index`, extracting with `codec`.
    pub fn new(index: &'a ContentIndex, codec: &'a dyn ArchiveCodec) -> Self {
        Self { index, codec }
    }

    /// Alias and display name of every collection, in configured order.
    pub fn list_collections(&self) -> Vec<CollectionSummary> {
        self.index.registry().summaries()
    }

    /// Virtual paths of a collection in discovery order.
    pub fn list_files(&self, alias: &str) -> ResolveResult<&'a [String]> {
        Ok(self.collection(alias)?.filenames())
    }

    /// Read the full contents of one virtual file.
    ///
    /// The path is normalized before lookup. A file the index knows about
    /// but which can no longer be read yields [`ResolveError::ReadFailure`].
    pub fn resolve(&self, alias: &str, virtual_path: &str) -> ResolveResult<Vec<u8>> {
        let collection = self.collection(alias)?;
        let path = normalize_virtual_path(virtual_path);
        let entry = collection
            .lookup(&path)
            .ok_or_else(|| ResolveError::UnknownPath {
                collection: alias.to_string(),
                path: path.clone(),
            })?;
        self.read_entry(entry)
    }

    /// Concatenate every file whose name ends in `.<extension>`.
    ///
    /// Files appear in index order, each as its virtual path, a newline, its
    /// contents decoded as UTF-8 (invalid sequences replaced) and a newline.
    /// A single leading `.` on `extension` is ignored.
    pub fn concat_by_extension(&self, alias: &str, extension: &str) -> ResolveResult<String> {
        let collection = self.collection(alias)?;
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        if extension.is_empty() {
            return Err(ResolveError::InvalidExtension);
        }
        let suffix = format!(".{}", extension);

        let mut out = String::new();
        let mut matched = 0usize;
        for entry in collection.iter() {
            if !entry.basename.ends_with(&suffix) {
                continue;
            }

            let bytes = self.read_entry(entry)?;
            out.push_str(entry.virtual_path);
            out.push('\n');
            out.push_str(&String::from_utf8_lossy(&bytes));
            out.push('\n');
            matched += 1;
        }

        debug!(
            collection = alias,
            extension,
            files = matched,
            bytes = out.len(),
            "Concatenated files"
        );
        Ok(out)
    }

    fn collection(&self, alias: &str) -> ResolveResult<&'a CollectionIndex> {
        self.index
            .collection(alias)
            .ok_or_else(|| ResolveError::UnknownCollection(alias.to_string()))
    }

    fn read_entry(&self, entry: VirtualFileEntry<'_>) -> ResolveResult<Vec<u8>> {
        let failure = |reason: String| ResolveError::ReadFailure {
            path: entry.virtual_path.to_string(),
            archive: entry.archive.clone(),
            reason,
        };

        let handle = self
            .codec
            .open(entry.archive)
            .map_err(|e| failure(e.to_string()))?;
        let mut reader = handle
            .open_entry(entry.entry_name)
            .map_err(|e| failure(e.to_string()))?;

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| failure(e.to_string()))?;
        Ok(data)
    }
}
