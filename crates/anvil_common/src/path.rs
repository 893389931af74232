//! Lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path lexically, without touching the filesystem.
///
/// Removes `.` components and folds `..` into the preceding normal component.
/// Leading `..` components of a relative path are kept. The result is used as
/// the identity of a source file, so `src/./a/../A.java` and `src/A.java`
/// compare equal.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_current_dir() {
        assert_eq!(
            normalize_path(Path::new("./src/./A.java")),
            PathBuf::from("src/A.java")
        );
    }

    #[test]
    fn folds_parent_dir() {
        assert_eq!(
            normalize_path(Path::new("src/pkg/../A.java")),
            PathBuf::from("src/A.java")
        );
    }

    #[test]
    fn keeps_leading_parent_dir() {
        assert_eq!(
            normalize_path(Path::new("../shared/B.java")),
            PathBuf::from("../shared/B.java")
        );
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }
}
