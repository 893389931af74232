//! Deletion of stale outputs.

use std::path::{Path, PathBuf};

use crate::error::{DeletionFailure, FailedDeletion};

/// Removes stale outputs from disk.
pub trait Deleter {
    /// Deletes the given artifact files and returns how many were removed.
    ///
    /// Files that are already gone are not an error. Sibling companions of an
    /// artifact `X.ext`, named `X$*.ext`, are removed with it.
    fn delete(&self, locations: &[PathBuf]) -> Result<usize, DeletionFailure>;

    /// Removes everything inside `dir`, keeping `dir` itself.
    ///
    /// Returns `true` if anything was removed.
    fn clean_directory(&self, dir: &Path) -> Result<bool, DeletionFailure>;
}

impl<D: Deleter + ?Sized> Deleter for &D {
    fn delete(&self, locations: &[PathBuf]) -> Result<usize, DeletionFailure> {
        (**self).delete(locations)
    }

    fn clean_directory(&self, dir: &Path) -> Result<bool, DeletionFailure> {
        (**self).clean_directory(dir)
    }
}

/// [`Deleter`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemDeleter;

impl FileSystemDeleter {
    fn companions(location: &Path) -> Vec<PathBuf> {
        let (Some(dir), Some(stem)) = (
            location.parent(),
            location.file_stem().and_then(|s| s.to_str()),
        ) else {
            return Vec::new();
        };
        let ext = location.extension().and_then(|e| e.to_str());
        let prefix = format!("{stem}$");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                let name_matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix));
                name_matches && path.extension().and_then(|e| e.to_str()) == ext
            })
            .collect()
    }

    fn remove(path: &Path, failures: &mut Vec<FailedDeletion>) -> bool {
        let result = if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        match result {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                failures.push(FailedDeletion {
                    path: path.to_path_buf(),
                    source: e,
                });
                false
            }
        }
    }
}

impl Deleter for FileSystemDeleter {
    fn delete(&self, locations: &[PathBuf]) -> Result<usize, DeletionFailure> {
        let mut failures = Vec::new();
        let mut removed = 0;
        for location in locations {
            for companion in Self::companions(location) {
                removed += usize::from(Self::remove(&companion, &mut failures));
            }
            removed += usize::from(Self::remove(location, &mut failures));
        }
        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(DeletionFailure { failures })
        }
    }

    fn clean_directory(&self, dir: &Path) -> Result<bool, DeletionFailure> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(DeletionFailure {
                    failures: vec![FailedDeletion {
                        path: dir.to_path_buf(),
                        source: e,
                    }],
                })
            }
        };
        let mut failures = Vec::new();
        let mut removed = false;
        for entry in entries.filter_map(Result::ok) {
            removed |= Self::remove(&entry.path(), &mut failures);
        }
        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(DeletionFailure { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"bytecode").unwrap();
    }

    #[test]
    fn deletes_artifact_and_companions() {
        let dir = tempfile::tempdir().unwrap();
        let owner = dir.path().join("p/A.class");
        let inner = dir.path().join("p/A$Inner.class");
        let other = dir.path().join("p/AB.class");
        let source_file = dir.path().join("p/A$Inner.java");
        for p in [&owner, &inner, &other, &source_file] {
            touch(p);
        }

        let removed = FileSystemDeleter.delete(&[owner.clone()]).unwrap();

        assert_eq!(removed, 2);
        assert!(!owner.exists());
        assert!(!inner.exists());
        assert!(other.exists());
        assert!(source_file.exists());
    }

    #[test]
    fn missing_files_are_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let removed = FileSystemDeleter
            .delete(&[dir.path().join("nope/Gone.class")])
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn clean_directory_keeps_root() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("classes");
        touch(&dest.join("a/A.class"));
        touch(&dest.join("B.class"));

        assert!(FileSystemDeleter.clean_directory(&dest).unwrap());
        assert!(dest.exists());
        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn clean_missing_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!FileSystemDeleter
            .clean_directory(&dir.path().join("absent"))
            .unwrap());
    }
}
