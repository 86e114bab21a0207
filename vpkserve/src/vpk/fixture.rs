//! Test helper that writes small VPK archives.

use std::path::Path;

use super::naming::{part_file_name, split_dir_name};
use super::{DIR_ARCHIVE_INDEX, ENTRY_TERMINATOR, SIGNATURE};

/// Builder for VPK files used in tests.
///
/// Entries are written grouped by extension, then by directory, each group
/// in order of first appearance, so a fixture whose files share one
/// extension and directory enumerates in insertion order.
pub(crate) struct VpkFixture {
    files: Vec<(String, Vec<u8>)>,
    version: u32,
    preload: usize,
}

impl VpkFixture {
    pub(crate) fn new() -> Self {
        Self {
            files: Vec::new(),
            version: 2,
            preload: 0,
        }
    }

    pub(crate) fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.files.push((name.to_string(), data.to_vec()));
        self
    }

    pub(crate) fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn with_preload(mut self, bytes: usize) -> Self {
        self.preload = bytes;
        self
    }

    /// Write a single-file archive with all data embedded.
    pub(crate) fn write_single(&self, path: &Path) {
        let (tree, data) = self.build(DIR_ARCHIVE_INDEX);
        let mut out = self.header(&tree, data.len());
        out.extend_from_slice(&tree);
        out.extend_from_slice(&data);
        std::fs::write(path, out).unwrap();
    }

    /// Write a `<stem>_dir.<ext>` directory file plus data part 000.
    pub(crate) fn write_multi(&self, dir_path: &Path) {
        let name = dir_path.file_name().unwrap().to_str().unwrap();
        let (stem, ext) = split_dir_name(name).unwrap();
        let (tree, data) = self.build(0);

        let mut out = self.header(&tree, 0);
        out.extend_from_slice(&tree);
        std::fs::write(dir_path, out).unwrap();
        std::fs::write(dir_path.with_file_name(part_file_name(stem, ext, 0)), data).unwrap();
    }

    fn header(&self, tree: &[u8], embedded: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(tree.len() as u32).to_le_bytes());
        if self.version == 2 {
            out.extend_from_slice(&(embedded as u32).to_le_bytes());
            out.extend_from_slice(&[0u8; 12]);
        }
        out
    }

    fn build(&self, archive_index: u16) -> (Vec<u8>, Vec<u8>) {
        // extension -> directory -> [(name, data)]
        let mut groups: Vec<(String, Vec<(String, Vec<(String, &[u8])>)>)> = Vec::new();
        for (full, data) in &self.files {
            let (dir, file) = full.rsplit_once('/').unwrap_or((" ", full.as_str()));
            let (name, ext) = file.rsplit_once('.').unwrap_or((file, " "));

            let ext_pos = match groups.iter().position(|(e, _)| e == ext) {
                Some(i) => i,
                None => {
                    groups.push((ext.to_string(), Vec::new()));
                    groups.len() - 1
                }
            };
            let dirs = &mut groups[ext_pos].1;
            let dir_pos = match dirs.iter().position(|(d, _)| d == dir) {
                Some(i) => i,
                None => {
                    dirs.push((dir.to_string(), Vec::new()));
                    dirs.len() - 1
                }
            };
            dirs[dir_pos].1.push((name.to_string(), data.as_slice()));
        }

        let mut tree = Vec::new();
        let mut blob = Vec::new();
        for (ext, dirs) in &groups {
            push_str(&mut tree, ext);
            for (dir, names) in dirs {
                push_str(&mut tree, dir);
                for (name, data) in names {
                    push_str(&mut tree, name);
                    let split = self.preload.min(data.len());
                    let (preload, rest) = data.split_at(split);
                    tree.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
                    tree.extend_from_slice(&(preload.len() as u16).to_le_bytes());
                    tree.extend_from_slice(&archive_index.to_le_bytes());
                    tree.extend_from_slice(&(blob.len() as u32).to_le_bytes());
                    tree.extend_from_slice(&(rest.len() as u32).to_le_bytes());
                    tree.extend_from_slice(&ENTRY_TERMINATOR.to_le_bytes());
                    tree.extend_from_slice(preload);
                    blob.extend_from_slice(rest);
                }
                tree.push(0);
            }
            tree.push(0);
        }
        tree.push(0);

        (tree, blob)
    }
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}
