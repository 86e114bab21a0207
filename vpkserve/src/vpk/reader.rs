//! Opening archives and streaming entry data.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::naming::{part_file_name, split_dir_name};
use super::tree::parse_tree;
use super::{
    VpkEntry, VpkError, VpkResult, DIR_ARCHIVE_INDEX, HEADER_SIZE_V1, HEADER_SIZE_V2, SIGNATURE,
};

/// Parsed VPK header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VpkHeader {
    /// Format version (1 or 2).
    pub version: u32,

    /// Size of the directory tree in bytes.
    pub tree_size: u32,
}

impl VpkHeader {
    /// Size of the header on disk.
    pub fn header_size(&self) -> u64 {
        if self.version == 1 {
            HEADER_SIZE_V1
        } else {
            HEADER_SIZE_V2
        }
    }

    /// Offset of embedded entry data in the directory file.
    pub fn data_offset(&self) -> u64 {
        self.header_size() + u64::from(self.tree_size)
    }
}

/// Where the data parts of an archive live.
#[derive(Debug, Clone)]
enum Layout {
    /// All data is embedded in the directory file.
    Single,
    /// Data parts are siblings named `<stem>_NNN.<ext>`.
    MultiPart { stem: String, ext: String },
}

/// An opened VPK archive.
///
/// Opening reads only the header and directory tree. Entry data is read on
/// demand through [`VpkArchive::open`]; each call opens its own file handle,
/// which is closed when the returned reader is dropped.
#[derive(Debug)]
pub struct VpkArchive {
    path: PathBuf,
    layout: Layout,
    header: VpkHeader,
    entries: Vec<VpkEntry>,
    by_name: HashMap<String, usize>,
}

impl VpkArchive {
    /// Open a multi-part archive from its `<stem>_dir.<ext>` directory file.
    pub fn open_dir(path: impl AsRef<Path>) -> VpkResult<Self> {
        let path = path.as_ref();
        let (stem, ext) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(split_dir_name)
            .ok_or_else(|| VpkError::NotDirectoryFile(path.to_path_buf()))?;
        let layout = Layout::MultiPart {
            stem: stem.to_string(),
            ext: ext.to_string(),
        };
        Self::open_with_layout(path, layout)
    }

    /// Open a single-file archive whose data is embedded after the tree.
    pub fn open_single(path: impl AsRef<Path>) -> VpkResult<Self> {
        Self::open_with_layout(path.as_ref(), Layout::Single)
    }

    fn open_with_layout(path: &Path, layout: Layout) -> VpkResult<Self> {
        let io_err = |source| VpkError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let header = read_header(&mut file).map_err(|e| match e {
            HeaderError::Io(source) => io_err(source),
            HeaderError::Vpk(e) => e,
        })?;

        let available = file
            .metadata()
            .map_err(io_err)?
            .len()
            .saturating_sub(header.header_size());
        if u64::from(header.tree_size) > available {
            return Err(VpkError::TruncatedTree {
                offset: available as usize,
            });
        }

        let mut tree = vec![0u8; header.tree_size as usize];
        file.seek(SeekFrom::Start(header.header_size()))
            .and_then(|_| file.read_exact(&mut tree))
            .map_err(io_err)?;

        let entries = parse_tree(&tree)?;
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            by_name.entry(entry.filename.clone()).or_insert(i);
        }

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            header,
            entries,
            by_name,
        })
    }

    /// Path of the directory file this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed header.
    #[cfg(test)]
    pub(crate) fn header(&self) -> VpkHeader {
        self.header
    }

    /// All entries, in directory tree order.
    pub fn entries(&self) -> &[VpkEntry] {
        &self.entries
    }

    /// Look up an entry by its full name.
    pub fn entry(&self, filename: &str) -> Option<&VpkEntry> {
        self.by_name.get(filename).map(|&i| &self.entries[i])
    }

    /// Path of the file holding data for `archive_index`.
    pub fn data_path(&self, archive_index: u16) -> PathBuf {
        match &self.layout {
            Layout::MultiPart { stem, ext } if archive_index != DIR_ARCHIVE_INDEX => self
                .path
                .with_file_name(part_file_name(stem, ext, archive_index)),
            _ => self.path.clone(),
        }
    }

    /// Open a stream over the contents of `filename`.
    ///
    /// The stream yields the preload bytes followed by the archive data, and
    /// fails with [`io::ErrorKind::InvalidData`] at end of stream if the CRC
    /// does not match the directory tree.
    pub fn open(&self, filename: &str) -> VpkResult<EntryReader> {
        let entry = self
            .entry(filename)
            .ok_or_else(|| VpkError::EntryNotFound(filename.to_string()))?;

        let data_path = self.data_path(entry.archive_index);
        let start = if entry.is_embedded() {
            self.header.data_offset() + u64::from(entry.offset)
        } else {
            u64::from(entry.offset)
        };

        let mut file = File::open(&data_path).map_err(|source| VpkError::Io {
            path: data_path.clone(),
            source,
        })?;
        file.seek(SeekFrom::Start(start))
            .map_err(|source| VpkError::Io {
                path: data_path,
                source,
            })?;

        Ok(EntryReader::new(entry, file))
    }

    /// Read the full contents of `filename`.
    #[cfg(test)]
    pub(crate) fn read(&self, filename: &str) -> VpkResult<Vec<u8>> {
        let mut reader = self.open(filename)?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|source| VpkError::Io {
                path: self.data_path(reader.archive_index),
                source,
            })?;
        Ok(buf)
    }
}

enum HeaderError {
    Io(io::Error),
    Vpk(VpkError),
}

impl From<io::Error> for HeaderError {
    fn from(e: io::Error) -> Self {
        HeaderError::Io(e)
    }
}

fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_header(reader: &mut impl Read) -> Result<VpkHeader, HeaderError> {
    let signature = read_u32(reader)?;
    if signature != SIGNATURE {
        return Err(HeaderError::Vpk(VpkError::BadSignature { found: signature }));
    }
    let version = read_u32(reader)?;
    if version != 1 && version != 2 {
        return Err(HeaderError::Vpk(VpkError::UnsupportedVersion(version)));
    }
    let tree_size = read_u32(reader)?;

    // Version 2 section sizes are not needed for reading entries.
    Ok(VpkHeader { version, tree_size })
}

/// Stream over one entry's contents.
///
/// Owns the file handle of the data part; dropping the reader closes it.
pub struct EntryReader {
    inner: io::Chain<Cursor<Vec<u8>>, io::Take<File>>,
    hasher: crc32fast::Hasher,
    expected_crc: u32,
    remaining: u64,
    archive_index: u16,
    verified: bool,
}

impl EntryReader {
    fn new(entry: &VpkEntry, file: File) -> Self {
        let data = file.take(u64::from(entry.length));
        Self {
            inner: Cursor::new(entry.preload.clone()).chain(data),
            hasher: crc32fast::Hasher::new(),
            expected_crc: entry.crc,
            remaining: entry.size(),
            archive_index: entry.archive_index,
            verified: false,
        }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.verified {
            return Ok(());
        }
        self.verified = true;

        if self.remaining > 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry data truncated, {} bytes missing", self.remaining),
            ));
        }
        let actual = self.hasher.clone().finalize();
        if actual != self.expected_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "CRC mismatch: expected {:#010x}, got {:#010x}",
                    self.expected_crc, actual
                ),
            ));
        }
        Ok(())
    }
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.finish()?;
            return Ok(0);
        }
        self.hasher.update(&buf[..n]);
        self.remaining = self.remaining.saturating_sub(n as u64);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vpk::fixture::VpkFixture;
    use tempfile::TempDir;

    #[test]
    fn test_open_single_and_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("single.vpk");
        VpkFixture::new()
            .file("scripts/items.txt", b"items")
            .file("materials/wall.vmt", b"LightmappedGeneric {}")
            .write_single(&path);

        let archive = VpkArchive::open_single(&path).unwrap();
        assert_eq!(archive.header().version, 2);
        assert_eq!(archive.entries().len(), 2);
        assert_eq!(archive.read("scripts/items.txt").unwrap(), b"items");
        assert_eq!(
            archive.read("materials/wall.vmt").unwrap(),
            b"LightmappedGeneric {}"
        );
    }

    #[test]
    fn test_open_dir_reads_from_data_part() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pak01_dir.vpk");
        VpkFixture::new()
            .file("sound/a.wav", b"RIFF....WAVE")
            .file("sound/b.wav", b"second")
            .write_multi(&path);

        assert!(temp.path().join("pak01_000.vpk").exists());

        let archive = VpkArchive::open_dir(&path).unwrap();
        assert_eq!(archive.read("sound/a.wav").unwrap(), b"RIFF....WAVE");
        assert_eq!(archive.read("sound/b.wav").unwrap(), b"second");
        assert_eq!(
            archive.data_path(0),
            temp.path().join("pak01_000.vpk")
        );
        assert_eq!(archive.data_path(DIR_ARCHIVE_INDEX), path);
    }

    #[test]
    fn test_version_one_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("old.vpk");
        VpkFixture::new()
            .with_version(1)
            .file("a.txt", b"version one")
            .write_single(&path);

        let archive = VpkArchive::open_single(&path).unwrap();
        assert_eq!(archive.header().version, 1);
        assert_eq!(archive.header().header_size(), HEADER_SIZE_V1);
        assert_eq!(archive.read("a.txt").unwrap(), b"version one");
    }

    #[test]
    fn test_preload_bytes_are_prepended() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pre_dir.vpk");
        VpkFixture::new()
            .with_preload(4)
            .file("models/box.mdl", b"IDSTmodel-body")
            .write_multi(&path);

        let archive = VpkArchive::open_dir(&path).unwrap();
        let entry = archive.entry("models/box.mdl").unwrap();
        assert_eq!(entry.preload, b"IDST");
        assert_eq!(archive.read("models/box.mdl").unwrap(), b"IDSTmodel-body");
    }

    #[test]
    fn test_open_dir_requires_dir_suffix() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.vpk");
        VpkFixture::new().file("a.txt", b"a").write_single(&path);

        assert!(matches!(
            VpkArchive::open_dir(&path),
            Err(VpkError::NotDirectoryFile(_))
        ));
    }

    #[test]
    fn test_bad_signature() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("garbage.vpk");
        std::fs::write(&path, b"PK\x03\x04 definitely not a vpk").unwrap();

        assert!(matches!(
            VpkArchive::open_single(&path),
            Err(VpkError::BadSignature { found: 0x0403_4B50 })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("v3.vpk");
        let mut bytes = SIGNATURE.to_le_bytes().to_vec();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            VpkArchive::open_single(&path),
            Err(VpkError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn test_missing_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("one.vpk");
        VpkFixture::new().file("a.txt", b"a").write_single(&path);

        let archive = VpkArchive::open_single(&path).unwrap();
        assert!(matches!(
            archive.open("b.txt"),
            Err(VpkError::EntryNotFound(name)) if name == "b.txt"
        ));
    }

    fn write_raw_v1(path: &Path, tree_size: u32, tree: &[u8], data: &[u8]) {
        let mut bytes = SIGNATURE.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&tree_size.to_le_bytes());
        bytes.extend_from_slice(tree);
        bytes.extend_from_slice(data);
        std::fs::write(path, bytes).unwrap();
    }

    fn embedded_record(tree: &mut Vec<u8>, name: &[u8], offset: u32, data: &[u8]) {
        tree.extend_from_slice(name);
        tree.push(0);
        tree.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
        tree.extend_from_slice(&0u16.to_le_bytes());
        tree.extend_from_slice(&DIR_ARCHIVE_INDEX.to_le_bytes());
        tree.extend_from_slice(&offset.to_le_bytes());
        tree.extend_from_slice(&(data.len() as u32).to_le_bytes());
        tree.extend_from_slice(&0xFFFFu16.to_le_bytes());
    }

    #[test]
    fn test_non_utf8_name_keeps_archive_readable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("names.vpk");
        let mut tree = b"txt\0 \0".to_vec();
        embedded_record(&mut tree, b"good", 0, b"fine");
        embedded_record(&mut tree, b"caf\xe9", 4, b"accent");
        tree.extend_from_slice(b"\0\0\0");
        write_raw_v1(&path, tree.len() as u32, &tree, b"fineaccent");

        let archive = VpkArchive::open_single(&path).unwrap();
        let names: Vec<_> = archive.entries().iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["good.txt", "caf\u{FFFD}.txt"]);
        assert_eq!(archive.read("good.txt").unwrap(), b"fine");
        assert_eq!(archive.read("caf\u{FFFD}.txt").unwrap(), b"accent");
    }

    #[test]
    fn test_oversized_tree_rejected_before_reading() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("huge.vpk");
        write_raw_v1(&path, u32::MAX, b"\0", b"");

        assert!(matches!(
            VpkArchive::open_single(&path),
            Err(VpkError::TruncatedTree { offset: 1 })
        ));
    }

    #[test]
    fn test_missing_data_part() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone_dir.vpk");
        VpkFixture::new().file("a.txt", b"data").write_multi(&path);
        std::fs::remove_file(temp.path().join("gone_000.vpk")).unwrap();

        let archive = VpkArchive::open_dir(&path).unwrap();
        assert!(matches!(archive.open("a.txt"), Err(VpkError::Io { .. })));
    }

    #[test]
    fn test_corrupted_data_fails_crc() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad_dir.vpk");
        VpkFixture::new().file("a.txt", b"original").write_multi(&path);
        std::fs::write(temp.path().join("bad_000.vpk"), b"tampered").unwrap();

        let archive = VpkArchive::open_dir(&path).unwrap();
        let err = archive.read("a.txt").unwrap_err();
        match err {
            VpkError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData)
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_data_part() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("short_dir.vpk");
        VpkFixture::new().file("a.txt", b"0123456789").write_multi(&path);
        std::fs::write(temp.path().join("short_000.vpk"), b"01234").unwrap();

        let archive = VpkArchive::open_dir(&path).unwrap();
        let mut reader = archive.open("a.txt").unwrap();
        let mut buf = Vec::new();
        let err = reader.read_to_end(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.remaining(), 5);
    }
}
