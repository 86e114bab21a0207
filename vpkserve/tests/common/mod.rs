//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

const SIGNATURE: u32 = 0x55AA_1234;
const EMBEDDED: u16 = 0x7FFF;

/// Writes VPK v2 archives whose entries enumerate in insertion order.
///
/// Each entry gets its own extension and directory group, which the format
/// allows and which keeps enumeration order identical to insertion order.
#[derive(Default)]
pub struct ArchiveWriter {
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.files.push((name.to_string(), data.as_ref().to_vec()));
        self
    }

    /// Write `<dir>/<stem>_dir.vpk` and `<dir>/<stem>_000.vpk`.
    pub fn write_multi(&self, dir: &Path, stem: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let (tree, data) = self.tree(0);
        let dir_path = dir.join(format!("{}_dir.vpk", stem));
        fs::write(&dir_path, [header(tree.len(), 0), tree].concat()).unwrap();
        fs::write(dir.join(format!("{}_000.vpk", stem)), data).unwrap();
        dir_path
    }

    /// Write a self-contained archive at `path`.
    pub fn write_single(&self, path: &Path) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let (tree, data) = self.tree(EMBEDDED);
        fs::write(path, [header(tree.len(), data.len()), tree, data].concat()).unwrap();
        path.to_path_buf()
    }

    fn tree(&self, archive_index: u16) -> (Vec<u8>, Vec<u8>) {
        let mut tree = Vec::new();
        let mut data = Vec::new();
        for (full, bytes) in &self.files {
            let (dir, file) = full.rsplit_once('/').unwrap_or((" ", full.as_str()));
            let (name, ext) = file.rsplit_once('.').unwrap_or((file, " "));
            for s in [ext, dir, name] {
                tree.extend_from_slice(s.as_bytes());
                tree.push(0);
            }
            tree.extend_from_slice(&crc32fast::hash(bytes).to_le_bytes());
            tree.extend_from_slice(&0u16.to_le_bytes());
            tree.extend_from_slice(&archive_index.to_le_bytes());
            tree.extend_from_slice(&(data.len() as u32).to_le_bytes());
            tree.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            tree.extend_from_slice(&0xFFFFu16.to_le_bytes());
            data.extend_from_slice(bytes);
            // end of names, end of directories
            tree.extend_from_slice(&[0, 0]);
        }
        tree.push(0);
        (tree, data)
    }
}

fn header(tree_size: usize, embedded: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(28);
    out.extend_from_slice(&SIGNATURE.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(tree_size as u32).to_le_bytes());
    out.extend_from_slice(&(embedded as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 12]);
    out
}
