//! Incremental recompilation engine.
//!
//! Decides which previously compiled outputs are stale after a set of source
//! changes, deletes them, recompiles only the affected sources and keeps a
//! persistent source-to-artifact mapping so the next build can do the same.
//! All reads of persisted state are fail-safe: a missing or corrupt mapping
//! degrades to a full compilation rather than failing the build.

#![warn(missing_docs)]

pub mod changes;
pub mod cleaning;
pub mod compiler;
pub mod converter;
pub mod deleter;
pub mod error;
pub mod mapping;
pub mod orchestrator;
pub mod recompile;
pub mod scratch;
pub mod source;

pub use changes::{ChangeDetector, DetectedChanges, SourceSnapshot};
pub use cleaning::{CleaningCompiler, WorkResult};
pub use compiler::{CompileOptions, CompileOutcome, CompileRequest, Compiler};
pub use converter::{FileNameDerivingConverter, MappingConverter, SourceFileClassNameConverter};
pub use deleter::{Deleter, FileSystemDeleter};
pub use error::{CompileError, DeletionFailure, FailedDeletion, StateError};
pub use mapping::ClassNameMapping;
pub use orchestrator::{CompilationMode, CompilationResult, IncrementalCompiler};
pub use recompile::{RecompilationSpec, RecompilationSpecProvider};
pub use scratch::{ProjectScratch, ScratchDirectoryProvider, ScratchSession};
pub use source::{ArtifactLayout, ChangeEvent, ChangeKind, OutputArtifact, SourceUnit};
