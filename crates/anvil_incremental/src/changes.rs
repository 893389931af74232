//! Content-hash based change detection.
//!
//! Hashes the current sources and compares them against the snapshot taken
//! after the last successful build, producing the [`ChangeEvent`] stream the
//! engine consumes. The snapshot is stored as `source-state.json` next to the
//! mapping file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anvil_common::ContentHash;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::source::{ChangeEvent, ChangeKind, SourceUnit};

/// Name of the snapshot file within the scratch directory.
pub const SNAPSHOT_FILE: &str = "source-state.json";

/// Content hashes of every source at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Content hash per source unit.
    pub sources: BTreeMap<SourceUnit, ContentHash>,
}

impl SourceSnapshot {
    /// Computes the content hash of a single file.
    pub fn hash_file(path: &Path) -> Result<ContentHash, StateError> {
        std::fs::File::open(path)
            .and_then(ContentHash::from_reader)
            .map_err(|e| StateError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Hashes `sources` in parallel.
    ///
    /// Files that cannot be read are left out and therefore show up as
    /// removed when compared against an older snapshot.
    pub fn capture(sources: &[SourceUnit]) -> Self {
        let sources = sources
            .par_iter()
            .filter_map(|source| {
                Self::hash_file(source.path())
                    .ok()
                    .map(|hash| (source.clone(), hash))
            })
            .collect();
        Self { sources }
    }

    /// Loads a snapshot, returning `None` if it is missing or corrupt.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the snapshot, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StateError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| StateError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| StateError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Lazily yields the changes from `previous` to `self`.
    ///
    /// Added and modified sources come first in path order, then removed ones.
    pub fn changes_since<'a>(
        &'a self,
        previous: &'a SourceSnapshot,
    ) -> impl Iterator<Item = ChangeEvent> + 'a {
        let current = self.sources.iter().filter_map(|(source, hash)| {
            let kind = match previous.sources.get(source) {
                Some(old) if old == hash => return None,
                Some(_) => ChangeKind::Modified,
                None => ChangeKind::Added,
            };
            Some(ChangeEvent {
                source: source.clone(),
                kind,
            })
        });
        let removed = previous
            .sources
            .keys()
            .filter(|source| !self.sources.contains_key(*source))
            .map(|source| ChangeEvent {
                source: source.clone(),
                kind: ChangeKind::Removed,
            });
        current.chain(removed)
    }
}

/// Result of comparing the current sources against the stored snapshot.
#[derive(Debug, Clone)]
pub struct DetectedChanges {
    previous: Option<SourceSnapshot>,
    current: SourceSnapshot,
}

impl DetectedChanges {
    /// `false` when no usable previous snapshot exists (first build or a
    /// corrupt state file); every source must then be compiled.
    pub fn is_incremental(&self) -> bool {
        self.previous.is_some()
    }

    /// The change events, empty when the run is not incremental.
    pub fn events(&self) -> impl Iterator<Item = ChangeEvent> + '_ {
        self.previous
            .iter()
            .flat_map(move |previous| self.current.changes_since(previous))
    }

    /// The snapshot of the current sources.
    pub fn current(&self) -> &SourceSnapshot {
        &self.current
    }
}

/// Detects source changes against the snapshot stored in a scratch directory.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    state_path: PathBuf,
}

impl ChangeDetector {
    /// Creates a detector storing its snapshot in `scratch_dir`.
    pub fn new(scratch_dir: &Path) -> Self {
        Self {
            state_path: scratch_dir.join(SNAPSHOT_FILE),
        }
    }

    /// Hashes `sources` and compares them against the stored snapshot.
    pub fn detect(&self, sources: &[SourceUnit]) -> DetectedChanges {
        DetectedChanges {
            previous: SourceSnapshot::load(&self.state_path),
            current: SourceSnapshot::capture(sources),
        }
    }

    /// Records the current snapshot. Call only after a successful build.
    pub fn commit(&self, detected: &DetectedChanges) -> Result<(), StateError> {
        detected.current.save(&self.state_path)
    }
}
