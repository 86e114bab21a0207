//! Archive discovery within a collection's search roots.

use std::path::Path;

use tracing::{debug, warn};

use crate::archive::ArchiveLocation;
use crate::collection::Collection;
use crate::vpk;
use crate::walker::{self, WalkEntry};

/// Extension of VPK containers.
const ARCHIVE_EXTENSION: &str = "vpk";

/// Find the archives of a collection, in scan order.
///
/// Search roots are walked in configured order, and files within each root
/// in walker order. Multi-part directory files (`*_dir.vpk`) are always
/// selected; other `.vpk` files that are not numbered data parts are
/// selected only when the collection enables single-file archives.
///
/// Unreadable roots and entries are logged and skipped.
pub fn scan_collection(collection: &Collection) -> Vec<ArchiveLocation> {
    let mut archives = Vec::new();

    for root in collection.search_roots() {
        let result = walker::walk(root, |entry| match entry {
            WalkEntry::File { path, .. } => {
                if is_archive(path, collection.single_file_archives()) {
                    archives.push(ArchiveLocation::new(path));
                }
            }
            WalkEntry::Error { path, error } => {
                warn!(
                    collection = collection.alias(),
                    path = %path.display(),
                    error = %error,
                    "Skipping unreadable entry"
                );
            }
        });

        match result {
            Ok(summary) => debug!(
                collection = collection.alias(),
                root = %root.display(),
                files = summary.files,
                directories = summary.directories,
                skipped_subtrees = summary.skipped_subtrees,
                "Search root scanned"
            ),
            Err(e) => warn!(
                collection = collection.alias(),
                error = %e,
                "Skipping search root"
            ),
        }
    }

    archives
}

/// Check whether a file is an archive container to index.
fn is_archive(path: &Path, single_file_archives: bool) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if let Some((_, ext)) = vpk::split_dir_name(name) {
        return ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION);
    }

    single_file_archives
        && name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        && !vpk::is_data_part(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveKind;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_is_archive_multi_part_only() {
        assert!(is_archive(Path::new("/x/pak01_dir.vpk"), false));
        assert!(is_archive(Path::new("/x/pak01_dir.VPK"), false));
        assert!(!is_archive(Path::new("/x/pak01_000.vpk"), false));
        assert!(!is_archive(Path::new("/x/custom.vpk"), false));
        assert!(!is_archive(Path::new("/x/notes_dir.txt"), false));
    }

    #[test]
    fn test_is_archive_with_single_files() {
        assert!(is_archive(Path::new("/x/pak01_dir.vpk"), true));
        assert!(is_archive(Path::new("/x/custom.vpk"), true));
        assert!(!is_archive(Path::new("/x/pak01_000.vpk"), true));
        assert!(!is_archive(Path::new("/x/readme.txt"), true));
    }

    #[test]
    fn test_scan_respects_root_order() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(&base.join("tf/tf2_textures_dir.vpk"));
        touch(&base.join("tf/tf2_textures_000.vpk"));
        touch(&base.join("tf/tf2_misc_dir.vpk"));
        touch(&base.join("hl2/hl2_misc_dir.vpk"));
        touch(&base.join("hl2/custom.vpk"));

        let collection = Collection::new("tf2", "Team Fortress 2")
            .with_search_root(base.join("tf"))
            .with_search_root(base.join("hl2"));

        let archives = scan_collection(&collection);
        let paths: Vec<_> = archives.iter().map(|a| a.path().to_path_buf()).collect();

        assert_eq!(
            paths,
            vec![
                base.join("tf/tf2_misc_dir.vpk"),
                base.join("tf/tf2_textures_dir.vpk"),
                base.join("hl2/hl2_misc_dir.vpk"),
            ]
        );
        assert!(archives.iter().all(|a| a.kind() == ArchiveKind::MultiPart));
    }

    #[test]
    fn test_scan_includes_single_files_when_enabled() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(&base.join("game/custom.vpk"));
        touch(&base.join("game/pak01_dir.vpk"));
        touch(&base.join("game/pak01_000.vpk"));

        let collection = Collection::new("g", "Game")
            .with_search_root(base.join("game"))
            .with_single_file_archives(true);

        let archives = scan_collection(&collection);
        let kinds: Vec<_> = archives.iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![ArchiveKind::SingleFile, ArchiveKind::MultiPart]);
    }

    #[test]
    fn test_scan_skips_missing_root() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(&base.join("present/pak01_dir.vpk"));

        let collection = Collection::new("g", "Game")
            .with_search_root(base.join("missing"))
            .with_search_root(base.join("present"));

        let archives = scan_collection(&collection);
        assert_eq!(archives.len(), 1);
    }
}
