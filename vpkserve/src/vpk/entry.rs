//! Directory tree entries.

/// A single file record from the VPK directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpkEntry {
    /// Full entry name (`path/filename.extension`).
    pub filename: String,

    /// CRC32 of the complete entry contents (preload + archive data).
    pub crc: u32,

    /// Bytes stored inline in the directory tree, returned first.
    pub preload: Vec<u8>,

    /// Data part holding the rest of the entry, or
    /// [`DIR_ARCHIVE_INDEX`](super::DIR_ARCHIVE_INDEX) for the directory file.
    pub archive_index: u16,

    /// Offset of the entry data inside its data part.
    pub offset: u32,

    /// Number of bytes stored in the data part.
    pub length: u32,
}

impl VpkEntry {
    /// File name without its directory.
    pub fn basename(&self) -> &str {
        self.filename
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.filename)
    }

    /// Total size of the entry in bytes.
    pub fn size(&self) -> u64 {
        self.preload.len() as u64 + u64::from(self.length)
    }

    /// Check whether the entry data lives in the directory file itself.
    pub fn is_embedded(&self) -> bool {
        self.archive_index == super::DIR_ARCHIVE_INDEX
    }
}

/// Build a full entry name from its tree components.
///
/// A single space stands for "no path" or "no extension".
pub(crate) fn join_name(path: &str, name: &str, extension: &str) -> String {
    let mut full = String::with_capacity(path.len() + name.len() + extension.len() + 2);
    if !path.is_empty() && path != " " {
        full.push_str(path);
        full.push('/');
    }
    full.push_str(name);
    if !extension.is_empty() && extension != " " {
        full.push('.');
        full.push_str(extension);
    }
    full
}
