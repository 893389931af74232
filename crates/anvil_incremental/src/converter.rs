//! Strategies deriving artifact names for a source unit.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anvil_common::normalize_path;

use crate::mapping::ClassNameMapping;
use crate::source::SourceUnit;

/// Derives the names of the artifacts a source unit produced.
pub trait SourceFileClassNameConverter {
    /// Returns the artifact names attributed to `source`.
    ///
    /// `None` means the converter has no knowledge of `source` at all, which
    /// is different from knowing that it produced nothing.
    fn artifact_names(&self, source: &SourceUnit) -> Option<BTreeSet<String>>;
}

/// Convention-based converter that needs no history.
///
/// Used when the compiler cannot report which artifacts each source produced.
/// `src/com/example/Widget.java` under source root `src` becomes
/// `com.example.Widget`. Nested artifacts such as `Widget$Part` are not named
/// here; the deleter removes them together with their owner.
#[derive(Debug, Clone)]
pub struct FileNameDerivingConverter {
    source_roots: Vec<PathBuf>,
}

impl FileNameDerivingConverter {
    /// Creates a converter resolving sources against the given roots, in order.
    pub fn new(source_roots: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        Self {
            source_roots: source_roots
                .into_iter()
                .map(|root| normalize_path(root.as_ref()))
                .collect(),
        }
    }

    fn derive(&self, path: &Path) -> Option<String> {
        let relative = self
            .source_roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .filter(|rel| rel.file_name().is_some());
        match relative {
            Some(rel) => {
                let parts: Vec<String> = rel
                    .with_extension("")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(parts.join("."))
            }
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
        }
    }
}

impl SourceFileClassNameConverter for FileNameDerivingConverter {
    fn artifact_names(&self, source: &SourceUnit) -> Option<BTreeSet<String>> {
        Some(self.derive(source.path()).into_iter().collect())
    }
}

/// History-based converter backed by the mapping of the previous build.
#[derive(Debug, Clone, Copy)]
pub struct MappingConverter<'a> {
    mapping: &'a ClassNameMapping,
}

impl<'a> MappingConverter<'a> {
    /// Wraps a loaded mapping.
    pub fn new(mapping: &'a ClassNameMapping) -> Self {
        Self { mapping }
    }
}

impl SourceFileClassNameConverter for MappingConverter<'_> {
    fn artifact_names(&self, source: &SourceUnit) -> Option<BTreeSet<String>> {
        self.mapping.get(source).cloned()
    }
}
