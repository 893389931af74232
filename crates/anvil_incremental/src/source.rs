//! Source unit and output artifact identities, and change events.

use std::fmt;
use std::path::{Path, PathBuf};

use anvil_common::normalize_path;
use serde::{Deserialize, Serialize};

/// A single source file tracked for change detection and output attribution.
///
/// The identity is the lexically normalized path, so two spellings of the
/// same path compare equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceUnit(PathBuf);

impl SourceUnit {
    /// Creates a source unit from a path, normalizing it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize_path(path.as_ref()))
    }

    /// Returns the normalized path.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A generated unit (e.g. a compiled class) and where it lives on disk.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OutputArtifact {
    /// Fully-qualified name, e.g. `com.example.Widget` or `com.example.Widget$Inner`.
    pub name: String,
    /// Location under the destination directory.
    pub location: PathBuf,
}

/// Maps artifact names to on-disk locations under a destination directory.
#[derive(Clone, Debug)]
pub struct ArtifactLayout {
    destination: PathBuf,
    extension: String,
}

impl ArtifactLayout {
    /// Creates a layout for artifacts with the given extension (no dot).
    pub fn new(destination: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            extension: extension.into(),
        }
    }

    /// Returns the destination directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns the artifact file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Derives the artifact for a fully-qualified name.
    ///
    /// `com.example.Widget` becomes `<destination>/com/example/Widget.<ext>`.
    pub fn artifact(&self, name: &str) -> OutputArtifact {
        let mut relative = PathBuf::from(name.replace('.', "/"));
        relative.set_extension(&self.extension);
        OutputArtifact {
            name: name.to_string(),
            location: self.destination.join(relative),
        }
    }
}

/// The kind of change observed for a source unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ChangeKind {
    /// The source did not exist in the previous build.
    Added,
    /// The source content changed.
    Modified,
    /// The source no longer exists.
    Removed,
}

/// A change to one source unit since the previous build.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChangeEvent {
    /// The affected source.
    pub source: SourceUnit,
    /// What happened to it.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// A newly added source.
    pub fn added(path: impl AsRef<Path>) -> Self {
        Self {
            source: SourceUnit::new(path),
            kind: ChangeKind::Added,
        }
    }

    /// A modified source.
    pub fn modified(path: impl AsRef<Path>) -> Self {
        Self {
            source: SourceUnit::new(path),
            kind: ChangeKind::Modified,
        }
    }

    /// A removed source.
    pub fn removed(path: impl AsRef<Path>) -> Self {
        Self {
            source: SourceUnit::new(path),
            kind: ChangeKind::Removed,
        }
    }
}
