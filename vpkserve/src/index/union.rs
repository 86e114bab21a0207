//! Union index merging the entries of all archives in a collection.

use std::collections::HashMap;

use rayon::prelude::*;
use thiserror::Error;
use tracing::warn;

use super::path::normalize_virtual_path;
use crate::archive::{ArchiveCodec, ArchiveEntry, ArchiveError, ArchiveLocation};

/// An archive that was discovered but could not be listed.
#[derive(Debug, Clone, Error)]
#[error("skipped archive {archive}: {reason}")]
pub struct ScanError {
    /// The archive that failed to open.
    pub archive: ArchiveLocation,
    /// Why it failed.
    pub reason: String,
}

/// Where an indexed file lives.
#[derive(Debug, Clone)]
struct FileSlot {
    /// Index into `CollectionIndex::archives`.
    archive: usize,
    /// Entry name as listed by the codec, when it differs from the key.
    raw_name: Option<String>,
    /// Basename as reported by the codec.
    basename: String,
}

/// A resolved index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualFileEntry<'a> {
    /// Normalized virtual path (the index key).
    pub virtual_path: &'a str,
    /// Name to request from the codec.
    pub entry_name: &'a str,
    /// File name without its directory, as reported by the codec.
    pub basename: &'a str,
    /// Archive owning the file.
    pub archive: &'a ArchiveLocation,
}

/// Merged index of all files across the archives of one collection.
///
/// When several archives contain the same virtual path, the archive
/// discovered first in scan order owns it; later duplicates are ignored.
/// The index is built once and never modified afterwards.
///
/// # Example
///
/// ```ignore
/// let archives = scan_collection(&collection);
/// let index = CollectionIndex::build(collection.alias(), &archives, &VpkCodec);
///
/// if let Some(entry) = index.lookup("materials/brick/wall.vmt") {
///     println!("owned by {}", entry.archive);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CollectionIndex {
    alias: String,
    /// Archives that were listed successfully, in scan order.
    archives: Vec<ArchiveLocation>,
    /// Virtual paths in discovery order, without duplicates.
    filenames: Vec<String>,
    /// Virtual path to owning archive.
    files: HashMap<String, FileSlot>,
    /// Archives that failed to open.
    skipped: Vec<ScanError>,
}

impl CollectionIndex {
    /// Create an empty index.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Default::default()
        }
    }

    /// List every archive with `codec` and merge the results.
    ///
    /// Archives are listed in parallel; the merge itself runs in scan order
    /// so ownership never depends on which listing finished first.
    pub fn build(alias: &str, archives: &[ArchiveLocation], codec: &dyn ArchiveCodec) -> Self {
        let listings: Vec<_> = archives
            .par_iter()
            .map(|location| {
                let entries = codec.open(location).map(|handle| handle.entries());
                (location.clone(), entries)
            })
            .collect();

        let mut index = Self::new(alias);
        for (location, entries) in listings {
            index.add_listing(location, entries);
        }
        index
    }

    /// Merge one archive listing into the index (first archive wins).
    pub fn add_listing(
        &mut self,
        location: ArchiveLocation,
        entries: Result<Vec<ArchiveEntry>, ArchiveError>,
    ) {
        let entries = match entries {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    collection = %self.alias,
                    archive = %location,
                    error = %e,
                    "Skipping archive that failed to open"
                );
                self.skipped.push(ScanError {
                    archive: location,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let archive = self.archives.len();
        self.archives.push(location);

        for entry in entries {
            let key = normalize_virtual_path(&entry.filename);
            if self.files.contains_key(&key) {
                continue;
            }
            let ArchiveEntry { filename, basename } = entry;
            let raw_name = (key != filename).then_some(filename);
            self.filenames.push(key.clone());
            self.files.insert(
                key,
                FileSlot {
                    archive,
                    raw_name,
                    basename,
                },
            );
        }
    }

    /// Alias of the collection this index belongs to.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Virtual paths in discovery order.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Look up an already-normalized virtual path.
    pub fn lookup(&self, virtual_path: &str) -> Option<VirtualFileEntry<'_>> {
        let (key, slot) = self.files.get_key_value(virtual_path)?;
        Some(self.entry(key, slot))
    }

    /// Archive owning `virtual_path`, if indexed.
    pub fn archive_for(&self, virtual_path: &str) -> Option<&ArchiveLocation> {
        self.lookup(virtual_path).map(|e| e.archive)
    }

    /// Iterate over all files in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = VirtualFileEntry<'_>> {
        self.filenames.iter().filter_map(|name| self.lookup(name))
    }

    /// Archives that contributed to the index, in scan order.
    pub fn archives(&self) -> &[ArchiveLocation] {
        &self.archives
    }

    /// Archives that were discovered but could not be listed.
    pub fn skipped(&self) -> &[ScanError] {
        &self.skipped
    }

    /// Number of indexed files.
    pub fn file_count(&self) -> usize {
        self.filenames.len()
    }

    /// Check if the index holds no files.
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    fn entry<'a>(&'a self, key: &'a str, slot: &'a FileSlot) -> VirtualFileEntry<'a> {
        VirtualFileEntry {
            virtual_path: key,
            entry_name: slot.raw_name.as_deref().unwrap_or(key),
            basename: &slot.basename,
            archive: &self.archives[slot.archive],
        }
    }
}
