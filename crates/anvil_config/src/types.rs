//! Configuration types deserialized from `anvil.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level build configuration parsed from `anvil.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Compilation settings.
    pub compile: CompileConfig,
    /// Worker isolation settings.
    #[serde(default)]
    pub workers: WorkerConfig,
}

/// Settings for the incremental compilation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileConfig {
    /// Whether incremental compilation is enabled. A disabled engine always
    /// performs full compilations, deletes any mapping file left by earlier
    /// builds and writes no new one.
    #[serde(default = "default_incremental")]
    pub incremental: bool,
    /// Directory that receives compiled artifacts.
    pub destination: PathBuf,
    /// File extension of compiled artifacts, without the dot.
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,
    /// Source roots used to derive artifact names from source paths.
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<PathBuf>,
    /// Scratch directory for per-task state such as the mapping file.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

fn default_incremental() -> bool {
    true
}

fn default_artifact_extension() -> String {
    "class".to_string()
}

fn default_source_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("build/tmp")
}

/// Settings for isolated work execution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerConfig {
    /// How units of work are isolated from the controlling process.
    #[serde(default)]
    pub isolation: IsolationMode,
}

/// How far a unit of work is isolated from the process that submitted it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Execute in the submitting context from the in-memory snapshot.
    #[default]
    None,
    /// Execute behind a code-loading boundary; parameters cross as bytes.
    Classloader,
    /// Execute in a separate process; parameters cross as bytes.
    Process,
}

impl IsolationMode {
    /// Returns `true` if work must be reduced to a transportable payload.
    pub fn crosses_boundary(self) -> bool {
        !matches!(self, IsolationMode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_does_not_cross_boundary() {
        assert!(!IsolationMode::None.crosses_boundary());
        assert!(IsolationMode::Classloader.crosses_boundary());
        assert!(IsolationMode::Process.crosses_boundary());
    }

    #[test]
    fn default_isolation_is_none() {
        assert_eq!(WorkerConfig::default().isolation, IsolationMode::None);
    }
}
