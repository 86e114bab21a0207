//! Directory tree parsing.

use std::borrow::Cow;

use super::entry::{join_name, VpkEntry};
use super::{VpkError, VpkResult, ENTRY_TERMINATOR};

/// Parse a directory tree into its entries, in tree order.
pub(crate) fn parse_tree(tree: &[u8]) -> VpkResult<Vec<VpkEntry>> {
    let mut cursor = TreeCursor { buf: tree, pos: 0 };
    let mut entries = Vec::new();

    loop {
        let extension = cursor.read_str()?;
        if extension.is_empty() {
            break;
        }
        loop {
            let path = cursor.read_str()?;
            if path.is_empty() {
                break;
            }
            loop {
                let name = cursor.read_str()?;
                if name.is_empty() {
                    break;
                }
                let filename = join_name(&path, &name, &extension);
                entries.push(cursor.read_entry(filename)?);
            }
        }
    }

    Ok(entries)
}

struct TreeCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TreeCursor<'a> {
    fn take(&mut self, len: usize) -> VpkResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(VpkError::TruncatedTree { offset: self.pos })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u16(&mut self) -> VpkResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> VpkResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a NUL-terminated string. Bytes that are not UTF-8 are replaced
    /// with U+FFFD.
    fn read_str(&mut self) -> VpkResult<Cow<'a, str>> {
        let start = self.pos;
        let len = self.buf[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(VpkError::TruncatedTree { offset: start })?;
        let bytes = self.take(len)?;
        self.pos += 1;
        Ok(String::from_utf8_lossy(bytes))
    }

    fn read_entry(&mut self, filename: String) -> VpkResult<VpkEntry> {
        let crc = self.read_u32()?;
        let preload_len = self.read_u16()?;
        let archive_index = self.read_u16()?;
        let offset = self.read_u32()?;
        let length = self.read_u32()?;
        let terminator = self.read_u16()?;
        if terminator != ENTRY_TERMINATOR {
            return Err(VpkError::BadTerminator {
                name: filename,
                found: terminator,
            });
        }
        let preload = self.take(usize::from(preload_len))?.to_vec();

        Ok(VpkEntry {
            filename,
            crc,
            preload,
            archive_index,
            offset,
            length,
        })
    }
}
