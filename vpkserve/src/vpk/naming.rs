//! File naming convention for multi-part VPK archives.
//!
//! `pak01_dir.vpk` is the directory file of a multi-part archive whose data
//! lives in `pak01_000.vpk`, `pak01_001.vpk`, and so on. This naming is the
//! only thing that distinguishes a multi-part directory file from a
//! single-file archive on disk.

/// Split a multi-part directory file name into `(stem, extension)`.
///
/// Returns `None` if the name does not follow the `<stem>_dir.<ext>`
/// convention.
///
/// ```
/// use vpkserve::vpk::split_dir_name;
///
/// assert_eq!(split_dir_name("pak01_dir.vpk"), Some(("pak01", "vpk")));
/// assert_eq!(split_dir_name("pak01_000.vpk"), None);
/// assert_eq!(split_dir_name("standalone.vpk"), None);
/// ```
pub fn split_dir_name(file_name: &str) -> Option<(&str, &str)> {
    let (base, ext) = file_name.rsplit_once('.')?;
    let stem = base.strip_suffix("_dir")?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some((stem, ext))
}

/// Name of data part `index` belonging to the directory file `<stem>_dir.<ext>`.
pub fn part_file_name(stem: &str, ext: &str, index: u16) -> String {
    format!("{}_{:03}.{}", stem, index, ext)
}

/// Check whether a file name is a numbered data part (`<stem>_NNN.<ext>`).
///
/// Data parts hold raw entry bytes without a directory tree and must never be
/// opened as archives on their own.
pub fn is_data_part(file_name: &str) -> bool {
    let Some((base, _ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    match base.rsplit_once('_') {
        Some((stem, digits)) => {
            !stem.is_empty() && digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_dir_name() {
        assert_eq!(split_dir_name("tf2_misc_dir.vpk"), Some(("tf2_misc", "vpk")));
        assert_eq!(split_dir_name("a_dir.pak"), Some(("a", "pak")));
        assert_eq!(split_dir_name("_dir.vpk"), None);
        assert_eq!(split_dir_name("pak01_dir"), None);
        assert_eq!(split_dir_name("pak01_dir."), None);
        assert_eq!(split_dir_name("pak01.vpk"), None);
    }

    #[test]
    fn test_part_file_name_is_zero_padded() {
        assert_eq!(part_file_name("pak01", "vpk", 0), "pak01_000.vpk");
        assert_eq!(part_file_name("pak01", "vpk", 42), "pak01_042.vpk");
        assert_eq!(part_file_name("pak01", "vpk", 123), "pak01_123.vpk");
    }

    #[test]
    fn test_is_data_part() {
        assert!(is_data_part("pak01_000.vpk"));
        assert!(is_data_part("tf2_textures_017.vpk"));
        assert!(!is_data_part("pak01_dir.vpk"));
        assert!(!is_data_part("pak01.vpk"));
        assert!(!is_data_part("pak01_0000.vpk"));
        assert!(!is_data_part("_000.vpk"));
        assert!(!is_data_part("noext_000"));
    }
}
