//! Path normalization and the loose-folder resolver.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Normalize a disk path for use as an identity key.
///
/// Existing paths are canonicalized. Paths that don't exist (or can't be represented
/// as UTF-8 after canonicalization) fall back to [`lexical_normalize`].
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    match path.canonicalize_utf8() {
        Ok(canonical) => canonical,
        Err(_) => lexical_normalize(path),
    }
}

/// Drop `.` components and fold `..` into the preceding component.
pub fn lexical_normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Utf8Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}

/// `true` when both paths name the same location after normalization.
pub fn same_path(a: &Utf8Path, b: &Utf8Path) -> bool {
    normalize_path(a) == normalize_path(b)
}

/// Normalize a logical (in-game) path: forward slashes, no leading slash.
pub fn normalize_logical_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Order loose folders so that any folder containing `current_file` comes first.
///
/// The partition is stable: folders keep their relative order within each half.
pub fn order_by_affinity<'a>(
    folders: &'a [Utf8PathBuf],
    current_file: Option<&Utf8Path>,
) -> Vec<&'a Utf8PathBuf> {
    let Some(current) = current_file.map(normalize_path) else {
        return folders.iter().collect();
    };

    let (preferred, rest): (Vec<_>, Vec<_>) = folders
        .iter()
        .partition(|folder| current.starts_with(normalize_path(folder)));

    preferred.into_iter().chain(rest).collect()
}

/// Find `logical` under one of `folders`, honouring path affinity.
///
/// Candidates whose `..` segments climb out of their folder are never returned.
pub fn resolve_in_folders(
    folders: &[Utf8PathBuf],
    logical: &str,
    current_file: Option<&Utf8Path>,
) -> Option<Utf8PathBuf> {
    let logical = normalize_logical_path(logical);
    if logical.is_empty() {
        return None;
    }

    order_by_affinity(folders, current_file)
        .into_iter()
        .filter_map(|folder| {
            let folder = lexical_normalize(folder);
            let candidate = lexical_normalize(&folder.join(&logical));
            candidate.starts_with(&folder).then_some(candidate)
        })
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Utf8Path::new("/game/citadel/./../core/")),
            Utf8PathBuf::from("/game/core")
        );
        assert_eq!(
            lexical_normalize(Utf8Path::new("../a/./b/..")),
            Utf8PathBuf::from("../a")
        );
        assert_eq!(lexical_normalize(Utf8Path::new("/..")), Utf8PathBuf::from("/"));
    }

    #[test]
    fn test_normalize_logical_path() {
        assert_eq!(
            normalize_logical_path("\\materials\\dev\\a.vmat_c"),
            "materials/dev/a.vmat_c"
        );
        assert_eq!(normalize_logical_path("/a/b"), "a/b");
    }

    #[test]
    fn test_same_path_nonexistent() {
        assert!(same_path(
            Utf8Path::new("/nope/x/../y/pak01_dir.vpk"),
            Utf8Path::new("/nope/y/pak01_dir.vpk")
        ));
    }

    #[test]
    fn test_affinity_prefers_folder_of_current_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let first = root.join("first");
        let second = root.join("second");
        for folder in [&first, &second] {
            fs::create_dir_all(folder.join("scripts")).unwrap();
            fs::write(folder.join("scripts/a.txt"), folder.as_str()).unwrap();
        }

        let folders = vec![first.clone(), second.clone()];
        let found = resolve_in_folders(&folders, "scripts/a.txt", None).unwrap();
        assert!(found.starts_with(&first));

        let current = second.join("scripts/current.txt");
        let found = resolve_in_folders(&folders, "scripts/a.txt", Some(&current)).unwrap();
        assert!(found.starts_with(&second));
    }

    #[test]
    fn test_affinity_partition_is_stable() {
        let folders = vec![
            Utf8PathBuf::from("/r/a"),
            Utf8PathBuf::from("/r/b"),
            Utf8PathBuf::from("/r/b/sub"),
            Utf8PathBuf::from("/r/c"),
        ];
        let ordered = order_by_affinity(&folders, Some(Utf8Path::new("/r/b/sub/x.txt")));
        let ordered: Vec<_> = ordered.into_iter().map(|p| p.as_str()).collect();
        assert_eq!(ordered, ["/r/b", "/r/b/sub", "/r/a", "/r/c"]);
    }

    #[test]
    fn test_parent_segments_cannot_leave_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path());
        let folder = root.join("game");
        fs::create_dir_all(folder.join("scripts")).unwrap();
        fs::write(root.join("secret.txt"), "secret").unwrap();
        fs::write(folder.join("scripts/a.txt"), "a").unwrap();

        let folders = vec![folder.clone()];
        assert!(resolve_in_folders(&folders, "../secret.txt", None).is_none());
        assert!(resolve_in_folders(&folders, "scripts/../../secret.txt", None).is_none());
        assert_eq!(
            resolve_in_folders(&folders, "scripts/./x/../a.txt", None),
            Some(folder.join("scripts/a.txt"))
        );
    }

    #[test]
    fn test_resolve_in_folders_missing() {
        let dir = tempfile::tempdir().unwrap();
        let folders = vec![utf8(dir.path())];
        assert!(resolve_in_folders(&folders, "nothing/here.txt", None).is_none());
        assert!(resolve_in_folders(&folders, "", None).is_none());
    }
}
