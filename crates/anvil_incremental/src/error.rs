//! Error types for the incremental recompilation engine.

use std::path::PathBuf;

use anvil_diagnostics::Diagnostic;

/// Errors reading or writing persisted engine state (the mapping file and the
/// source snapshot).
///
/// Reads are fail-safe at the call site: the orchestrator turns any of these
/// into a full compilation. Writes surface as warnings.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// An I/O error occurred while reading or writing a state file.
    #[error("state I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A line of the mapping file does not follow `<source> -> <artifacts>`.
    #[error("malformed mapping file {path} at line {line}: {reason}")]
    Parse {
        /// The mapping file path.
        path: PathBuf,
        /// 1-based line number of the offending line.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// A state file could not be serialized or deserialized.
    #[error("state serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

/// A single stale output that could not be removed.
#[derive(Debug)]
pub struct FailedDeletion {
    /// The output that is still on disk.
    pub path: PathBuf,
    /// Why it could not be removed.
    pub source: std::io::Error,
}

/// One or more stale outputs could not be removed.
#[derive(Debug, thiserror::Error)]
#[error("could not delete {} stale output(s): {}", .failures.len(), describe(.failures))]
pub struct DeletionFailure {
    /// Every output that could not be removed.
    pub failures: Vec<FailedDeletion>,
}

fn describe(failures: &[FailedDeletion]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path.display(), f.source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Faults that abort a compilation.
///
/// Each variant names the unit of work and the phase that failed. Mapping
/// problems never appear here; they degrade to full compilation or warnings.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Stale outputs could not be removed; the compiler was not invoked.
    #[error("{unit}: delete phase failed: {source}")]
    Delete {
        /// The unit of work (task path).
        unit: String,
        /// The outputs that survived.
        source: DeletionFailure,
    },

    /// The underlying compiler reported failure; the mapping was not merged.
    #[error("{unit}: compile phase failed with {error_count} error(s){}", first_error(.diagnostics))]
    Compile {
        /// The unit of work (task path).
        unit: String,
        /// Number of error-severity diagnostics.
        error_count: usize,
        /// Everything the compiler reported.
        diagnostics: Vec<Diagnostic>,
    },
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .find(|d| d.severity.is_error())
        .map(|d| format!(": {}", d.message))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = StateError::Io {
            path: PathBuf::from("build/tmp/compile/source-classes-mapping.txt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("state I/O error"));
        assert!(msg.contains("source-classes-mapping.txt"));
    }

    #[test]
    fn parse_error_display() {
        let err = StateError::Parse {
            path: PathBuf::from("mapping.txt"),
            line: 3,
            reason: "missing ' -> ' separator".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("missing ' -> ' separator"));
    }

    #[test]
    fn deletion_failure_lists_paths() {
        let err = DeletionFailure {
            failures: vec![FailedDeletion {
                path: PathBuf::from("out/A.class"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("1 stale output(s)"));
        assert!(msg.contains("out/A.class"));
    }

    #[test]
    fn compile_error_names_unit_phase_and_cause() {
        let err = CompileError::Compile {
            unit: ":app:compileJava".to_string(),
            error_count: 1,
            diagnostics: vec![Diagnostic::error("cannot find symbol")],
        };
        let msg = err.to_string();
        assert!(msg.contains(":app:compileJava"));
        assert!(msg.contains("compile phase"));
        assert!(msg.contains("cannot find symbol"));
    }

    #[test]
    fn delete_error_names_phase() {
        let err = CompileError::Delete {
            unit: ":lib:compileJava".to_string(),
            source: DeletionFailure { failures: vec![] },
        };
        assert!(err.to_string().contains("delete phase"));
    }
}
