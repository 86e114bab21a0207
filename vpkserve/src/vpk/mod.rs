//! Reader for Valve VPK archives.
//!
//! A VPK archive is either a single file holding both the directory tree and
//! the entry data, or a multi-part set: a `<stem>_dir.vpk` directory file
//! plus numbered data parts `<stem>_000.vpk`, `<stem>_001.vpk`, ...
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────┐
//! │ header (v1: 12 B,    │  signature 0x55AA1234, version, tree size
//! │         v2: 28 B)    │  (+ data/md5/signature section sizes in v2)
//! ├──────────────────────┤
//! │ directory tree       │  extension → path → filename → entry record
//! ├──────────────────────┤
//! │ embedded data        │  entries with archive index 0x7FFF
//! └──────────────────────┘
//! ```
//!
//! Reading is strictly read-only; archives are never modified.

mod entry;
#[cfg(test)]
pub(crate) mod fixture;
mod naming;
mod reader;
mod tree;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use entry::VpkEntry;
pub use naming::{is_data_part, part_file_name, split_dir_name};
pub use reader::{EntryReader, VpkArchive};

/// Signature found at the start of every VPK directory file.
pub const SIGNATURE: u32 = 0x55AA_1234;

/// Archive index meaning "data is stored in the directory file itself".
pub const DIR_ARCHIVE_INDEX: u16 = 0x7FFF;

/// Terminator closing every entry record in the directory tree.
pub const ENTRY_TERMINATOR: u16 = 0xFFFF;

/// Header size of a version 1 archive.
pub const HEADER_SIZE_V1: u64 = 12;

/// Header size of a version 2 archive.
pub const HEADER_SIZE_V2: u64 = 28;

/// Result type for VPK operations.
pub type VpkResult<T> = Result<T, VpkError>;

/// Errors produced while reading a VPK archive.
#[derive(Debug, Error)]
pub enum VpkError {
    /// Reading the directory file or a data part failed.
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The file does not start with the VPK signature.
    #[error("not a VPK file (signature {found:#010x})")]
    BadSignature { found: u32 },

    /// The header declares a version this reader does not understand.
    #[error("unsupported VPK version {0}")]
    UnsupportedVersion(u32),

    /// The directory tree ended in the middle of a record.
    #[error("directory tree truncated at byte {offset}")]
    TruncatedTree { offset: usize },

    /// An entry record is not closed by the expected terminator.
    #[error("entry '{name}' has bad terminator {found:#06x}")]
    BadTerminator { name: String, found: u16 },

    /// The archive has no entry with the requested name.
    #[error("no entry named '{0}'")]
    EntryNotFound(String),

    /// A multi-part open was requested for a file without the `_dir` suffix.
    #[error("{} is not a VPK directory file", .0.display())]
    NotDirectoryFile(PathBuf),
}
