//! Virtual path normalization.

/// Normalize a virtual path for lookup and extraction.
///
/// Backslashes become forward slashes, then the path is cleaned lexically:
/// repeated slashes collapse, `.` segments are dropped, and `..` removes the
/// preceding segment. A `..` that would climb above the start of a relative
/// path is kept; above the root of a rooted path it is dropped. An empty
/// result is `"."`.
///
/// ```
/// use vpkserve::index::normalize_virtual_path;
///
/// assert_eq!(normalize_virtual_path("materials\\brick\\wall.vmt"), "materials/brick/wall.vmt");
/// assert_eq!(normalize_virtual_path("materials/./brick/../wall.vmt"), "materials/wall.vmt");
/// assert_eq!(normalize_virtual_path("a//b/"), "a/b");
/// ```
pub fn normalize_virtual_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let rooted = path.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_backslashes_converted() {
        assert_eq!(normalize_virtual_path(r"scripts\items\items_game.txt"), "scripts/items/items_game.txt");
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(normalize_virtual_path("./a/./b"), "a/b");
        assert_eq!(normalize_virtual_path("a/b/../c"), "a/c");
        assert_eq!(normalize_virtual_path("a/../../b"), "../b");
        assert_eq!(normalize_virtual_path("../../a"), "../../a");
    }

    #[test]
    fn test_rooted_paths() {
        assert_eq!(normalize_virtual_path("/a/b"), "/a/b");
        assert_eq!(normalize_virtual_path("/../a"), "/a");
        assert_eq!(normalize_virtual_path("/"), "/");
        assert_eq!(normalize_virtual_path("\\a"), "/a");
    }

    #[test]
    fn test_empty_paths() {
        assert_eq!(normalize_virtual_path(""), ".");
        assert_eq!(normalize_virtual_path("."), ".");
        assert_eq!(normalize_virtual_path("a/.."), ".");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(path in r"[a-z./\\]{0,24}") {
            let once = normalize_virtual_path(&path);
            let twice = normalize_virtual_path(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalized_has_no_backslash_or_dot_segments(path in r"[a-z./\\]{0,24}") {
            let normalized = normalize_virtual_path(&path);
            prop_assert!(!normalized.contains('\\'));
            prop_assert!(!normalized.contains("//"));
            if normalized != "." {
                prop_assert!(normalized.split('/').all(|s| s != "."));
            }
        }
    }
}
