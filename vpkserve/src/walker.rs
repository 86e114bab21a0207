//! Symlink-following directory walker with cycle detection.
//!
//! [`walk`] reports every regular file reachable from a root directory.
//! Symbolic links to directories are followed as if they were real
//! subtrees, but each directory is read at most once per walk: directories
//! are tracked by canonical path, and a repeat visit (a link cycle, or two
//! links to the same target) skips the subtree.
//!
//! Paths handed to the visitor are *logical*: they are built from the root
//! as given plus the names of the entries traversed, including the names of
//! symlinks, never from the resolved target path.
//!
//! ```text
//! content/
//! ├── tf/
//! │   └── tf2_misc_dir.vpk
//! └── shared -> /mnt/depot/shared     (symlink)
//!     └── hl2_misc_dir.vpk
//!
//! visited: content/shared/hl2_misc_dir.vpk   (not /mnt/depot/shared/...)
//!          content/tf/tf2_misc_dir.vpk
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors that abort a walk.
///
/// Per-entry failures never abort a walk; they are reported to the visitor
/// as [`WalkEntry::Error`] instead.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The walk root could not be resolved.
    #[error("cannot walk {}: {source}", path.display())]
    Root { path: PathBuf, source: io::Error },
}

/// A single item reported by [`walk`].
#[derive(Debug)]
pub enum WalkEntry<'a> {
    /// A regular file, reached directly or through symlinks.
    File {
        /// Logical path of the file.
        path: &'a Path,
        /// Metadata of the file (symlinks already followed).
        metadata: &'a Metadata,
    },

    /// An entry that could not be inspected (dangling symlink, unreadable
    /// directory, failed stat). The walk continues after it.
    Error {
        /// Logical path of the failing entry.
        path: &'a Path,
        /// The underlying I/O error.
        error: &'a io::Error,
    },
}

impl WalkEntry<'_> {
    /// Logical path of this entry.
    pub fn path(&self) -> &Path {
        match self {
            WalkEntry::File { path, .. } | WalkEntry::Error { path, .. } => path,
        }
    }
}

/// Counters collected during a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Regular files reported to the visitor.
    pub files: usize,
    /// Directories read.
    pub directories: usize,
    /// Subtrees skipped because their canonical directory was already read.
    pub skipped_subtrees: usize,
    /// Per-entry errors reported to the visitor.
    pub errors: usize,
}

/// Walk `root`, calling `visit` for every reachable regular file and every
/// per-entry error.
///
/// Entries within a directory are visited in lexicographic order of their
/// names, so repeated walks over unchanged input report files in the same
/// order. If `root` is itself a regular file it is reported alone.
///
/// # Errors
///
/// Returns [`WalkError::Root`] only if `root` itself cannot be resolved.
pub fn walk<F>(root: &Path, visit: F) -> Result<WalkSummary, WalkError>
where
    F: FnMut(WalkEntry<'_>),
{
    let canonical = fs::canonicalize(root).map_err(|source| WalkError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    let metadata = fs::metadata(&canonical).map_err(|source| WalkError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let mut walker = Walker {
        visited: HashSet::new(),
        summary: WalkSummary::default(),
        visit,
    };

    if metadata.is_dir() {
        walker.descend(canonical, root);
    } else if metadata.is_file() {
        walker.file(root, &metadata);
    }

    Ok(walker.summary)
}

struct Walker<F> {
    /// Canonical paths of every directory read so far.
    visited: HashSet<PathBuf>,
    summary: WalkSummary,
    visit: F,
}

impl<F> Walker<F>
where
    F: FnMut(WalkEntry<'_>),
{
    fn file(&mut self, logical: &Path, metadata: &Metadata) {
        self.summary.files += 1;
        (self.visit)(WalkEntry::File {
            path: logical,
            metadata,
        });
    }

    fn error(&mut self, logical: &Path, error: &io::Error) {
        self.summary.errors += 1;
        (self.visit)(WalkEntry::Error {
            path: logical,
            error,
        });
    }

    /// Read the directory at `canonical`, reporting its contents under `logical`.
    fn descend(&mut self, canonical: PathBuf, logical: &Path) {
        if self.visited.contains(&canonical) {
            debug!(
                path = %logical.display(),
                target = %canonical.display(),
                "Directory already visited, skipping subtree"
            );
            self.summary.skipped_subtrees += 1;
            return;
        }
        self.visited.insert(canonical.clone());

        let names = match sorted_names(&canonical) {
            Ok(names) => names,
            Err(e) => {
                self.error(logical, &e);
                return;
            }
        };
        self.summary.directories += 1;

        for name in names {
            let physical = canonical.join(&name);
            let child = logical.join(&name);
            self.entry(&physical, &child);
        }
    }

    fn entry(&mut self, physical: &Path, logical: &Path) {
        let link_metadata = match fs::symlink_metadata(physical) {
            Ok(m) => m,
            Err(e) => return self.error(logical, &e),
        };

        if link_metadata.file_type().is_symlink() {
            let target = match fs::canonicalize(physical) {
                Ok(t) => t,
                Err(e) => return self.error(logical, &e),
            };
            match fs::metadata(&target) {
                Ok(m) if m.is_dir() => self.descend(target, logical),
                Ok(m) if m.is_file() => self.file(logical, &m),
                Ok(_) => {}
                Err(e) => self.error(logical, &e),
            }
        } else if link_metadata.is_dir() {
            match fs::canonicalize(physical) {
                Ok(canonical) => self.descend(canonical, logical),
                Err(e) => self.error(logical, &e),
            }
        } else if link_metadata.is_file() {
            self.file(logical, &link_metadata);
        }
    }
}

fn sorted_names(dir: &Path) -> io::Result<Vec<OsString>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
