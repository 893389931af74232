//! Per-invocation scratch space owned by the orchestrator.
//!
//! The mapping file lives in a task-specific scratch directory that survives
//! between builds. Staging files used for atomic rewrites live in a temporary
//! directory that is released when the [`ScratchSession`] is dropped, whether
//! the build succeeded or not.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use anvil_common::ContentHash;

use crate::error::StateError;
use crate::mapping::MAPPING_FILE;

/// Supplies the stable scratch directory of a unit of work.
pub trait ScratchDirectoryProvider {
    /// Returns the scratch directory for `owner`. The same owner must always
    /// get the same directory.
    fn scratch_dir(&self, owner: &str) -> PathBuf;
}

/// Scratch directories under a project-wide root, one per task path.
///
/// The directory name is the task path with unsafe characters replaced,
/// followed by a digest of the raw task path, so distinct owners never share
/// a directory.
#[derive(Debug, Clone)]
pub struct ProjectScratch {
    root: PathBuf,
}

impl ProjectScratch {
    /// Creates a provider rooted at `root` (typically `build/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScratchDirectoryProvider for ProjectScratch {
    fn scratch_dir(&self, owner: &str) -> PathBuf {
        let name: String = owner
            .trim_start_matches(':')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let name = if name.is_empty() { "_root" } else { &name };
        let digest = ContentHash::from_bytes(owner.as_bytes()).to_string();
        self.root.join(format!("{name}-{}", &digest[..16]))
    }
}

/// Scratch resources of one build invocation.
///
/// The staging directory is created on first use and removed on drop.
pub struct ScratchSession {
    dir: PathBuf,
    staging: OnceCell<tempfile::TempDir>,
}

impl ScratchSession {
    /// Opens a session for the given scratch directory. Nothing is created yet.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            staging: OnceCell::new(),
        }
    }

    /// The scratch directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the persisted mapping file.
    pub fn mapping_path(&self) -> PathBuf {
        self.dir.join(MAPPING_FILE)
    }

    /// Returns the staging directory, creating it on first use.
    pub fn staging_dir(&self) -> Result<&Path, StateError> {
        if let Some(staging) = self.staging.get() {
            return Ok(staging.path());
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| StateError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.dir)
            .map_err(|e| StateError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
        Ok(self.staging.get_or_init(|| staging).path())
    }
}
