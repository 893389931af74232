//! Full-versus-incremental compilation policy.
//!
//! [`IncrementalCompiler`] decides per invocation whether an incremental
//! compilation is possible, wires converter, provider and cleaning compiler
//! together, and merges the newly observed associations into the persisted
//! mapping after a successful incremental run.

use std::path::PathBuf;

use anvil_config::CompileConfig;
use anvil_diagnostics::{Diagnostic, DiagnosticSink};

use crate::cleaning::{CleaningCompiler, WorkResult};
use crate::compiler::{CompileOptions, Compiler};
use crate::converter::{FileNameDerivingConverter, MappingConverter};
use crate::deleter::{Deleter, FileSystemDeleter};
use crate::error::CompileError;
use crate::mapping::ClassNameMapping;
use crate::recompile::{RecompilationSpec, RecompilationSpecProvider};
use crate::scratch::{ProjectScratch, ScratchDirectoryProvider, ScratchSession};
use crate::source::{ArtifactLayout, ChangeEvent, SourceUnit};

/// How a compilation was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationMode {
    /// Every source was compiled into a purged destination.
    Full {
        /// Why incremental compilation was not used.
        cause: String,
    },
    /// Only the invalidated sources were compiled.
    Incremental {
        /// Number of sources handed to the compiler.
        recompiled: usize,
        /// Number of stale artifacts scheduled for deletion.
        deleted: usize,
    },
}

/// Outcome of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompilationResult {
    /// Whether any output was deleted or produced.
    pub did_work: bool,
    /// Full or incremental, and why.
    pub mode: CompilationMode,
    /// Compiler warnings plus engine warnings such as a failed mapping write.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    /// Returns `true` if the compilation was incremental.
    pub fn is_incremental(&self) -> bool {
        matches!(self.mode, CompilationMode::Incremental { .. })
    }
}

/// Top-level incremental compilation engine for one unit of work.
///
/// The engine is the sole writer of the unit's mapping file. Callers must
/// serialize invocations against the same scratch directory.
pub struct IncrementalCompiler<C, D = FileSystemDeleter, S = ProjectScratch> {
    unit: String,
    incremental: bool,
    layout: ArtifactLayout,
    source_roots: Vec<PathBuf>,
    options: CompileOptions,
    compiler: C,
    deleter: D,
    scratch: S,
}

impl<C: Compiler> IncrementalCompiler<C> {
    /// Creates an engine from the `[compile]` section of `anvil.toml`, using
    /// the filesystem deleter and the configured scratch directory.
    pub fn from_config(unit: impl Into<String>, config: &CompileConfig, compiler: C) -> Self {
        Self::new(
            unit,
            config,
            compiler,
            FileSystemDeleter,
            ProjectScratch::new(&config.scratch_dir),
        )
    }
}

impl<C, D, S> IncrementalCompiler<C, D, S>
where
    C: Compiler,
    D: Deleter,
    S: ScratchDirectoryProvider,
{
    /// Creates an engine with explicit collaborators.
    pub fn new(
        unit: impl Into<String>,
        config: &CompileConfig,
        compiler: C,
        deleter: D,
        scratch: S,
    ) -> Self {
        Self {
            unit: unit.into(),
            incremental: config.incremental,
            layout: ArtifactLayout::new(&config.destination, &config.artifact_extension),
            source_roots: config.source_roots.clone(),
            options: CompileOptions {
                destination: config.destination.clone(),
                ..CompileOptions::default()
            },
            compiler,
            deleter,
            scratch,
        }
    }

    /// Replaces the options handed to the underlying compiler. The
    /// destination always stays the configured one.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = CompileOptions {
            destination: self.options.destination,
            ..options
        };
        self
    }

    /// Returns the unit of work this engine compiles.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns the scratch directory holding this unit's persisted state.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch.scratch_dir(&self.unit)
    }

    /// Compiles `sources`, incrementally when possible.
    ///
    /// `changes` is consumed at most once. Set `is_incremental_run_possible`
    /// to `false` when history is known to be invalid (first build, changed
    /// classpath). Scratch staging resources are released before returning.
    #[tracing::instrument(level = "debug", skip_all, fields(unit = %self.unit))]
    pub fn compile(
        &self,
        sources: &[SourceUnit],
        changes: impl IntoIterator<Item = ChangeEvent>,
        is_incremental_run_possible: bool,
    ) -> Result<CompilationResult, CompileError> {
        let session = ScratchSession::new(self.scratch.scratch_dir(&self.unit));
        let sink = DiagnosticSink::new();

        if !self.incremental {
            return self.full(&session, &sink, sources, "incremental compilation is disabled");
        }
        if !is_incremental_run_possible {
            return self.full(&session, &sink, sources, "no usable history for this build");
        }

        if !self.compiler.reports_associations() {
            let converter = FileNameDerivingConverter::new(&self.source_roots);
            let spec = RecompilationSpecProvider::new(&self.layout).provide(changes, &converter);
            return match spec.full_rebuild_cause.clone() {
                Some(cause) => self.full(&session, &sink, sources, &cause),
                None => self.incremental(&spec).map(|(result, mode)| {
                    finish(result.did_work, mode, result.diagnostics, &sink)
                }),
            };
        }

        let mut mapping = match ClassNameMapping::read(&session.mapping_path()) {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                return self.full(
                    &session,
                    &sink,
                    sources,
                    "no source-to-artifact mapping from a previous build",
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable source-to-artifact mapping");
                let cause = format!("unreadable source-to-artifact mapping: {e}");
                return self.full(&session, &sink, sources, &cause);
            }
        };

        let spec = RecompilationSpecProvider::new(&self.layout)
            .provide(changes, &MappingConverter::new(&mapping));
        if let Some(cause) = spec.full_rebuild_cause.as_deref() {
            return self.full(&session, &sink, sources, cause);
        }

        let (result, mode) = self.incremental(&spec)?;
        mapping.merge(
            &result.associations,
            &spec.sources_to_recompile,
            &spec.removed_sources,
        );
        self.persist(&session, &sink, &mapping);
        Ok(finish(result.did_work, mode, result.diagnostics, &sink))
    }

    fn cleaning(&self) -> CleaningCompiler<'_, C, D> {
        CleaningCompiler::new(&self.unit, &self.compiler, &self.deleter, &self.options)
    }

    fn incremental(
        &self,
        spec: &RecompilationSpec,
    ) -> Result<(WorkResult, CompilationMode), CompileError> {
        let mode = CompilationMode::Incremental {
            recompiled: spec.sources_to_recompile.len(),
            deleted: spec.artifacts_to_delete.len(),
        };
        tracing::info!(
            recompile = spec.sources_to_recompile.len(),
            delete = spec.artifacts_to_delete.len(),
            "performing incremental compilation"
        );
        Ok((self.cleaning().execute(spec)?, mode))
    }

    /// Compiles every source. The old mapping is discarded before the
    /// destination is purged, so a failed full build leaves no history behind.
    /// On success the mapping is rewritten from what this run reports.
    fn full(
        &self,
        session: &ScratchSession,
        sink: &DiagnosticSink,
        sources: &[SourceUnit],
        cause: &str,
    ) -> Result<CompilationResult, CompileError> {
        tracing::info!(cause, "performing full compilation");
        self.discard_mapping(session);
        let result = self.cleaning().execute_full(sources)?;
        if self.incremental && self.compiler.reports_associations() {
            self.persist(session, sink, &result.associations);
        }
        Ok(finish(
            result.did_work,
            CompilationMode::Full {
                cause: cause.to_string(),
            },
            result.diagnostics,
            sink,
        ))
    }

    /// Writes the mapping atomically. Failure leaves the compiled outputs
    /// valid, so it is reported as a warning rather than an error.
    fn persist(&self, session: &ScratchSession, sink: &DiagnosticSink, mapping: &ClassNameMapping) {
        let path = session.mapping_path();
        let written = session
            .staging_dir()
            .and_then(|staging| mapping.write_atomically(&path, staging));
        if let Err(e) = written {
            tracing::warn!(error = %e, "could not persist source-to-artifact mapping");
            sink.emit(
                Diagnostic::warning(format!(
                    "{}: could not persist source-to-artifact mapping: {e}",
                    self.unit
                ))
                .with_note("the next build of this unit will be a full compilation"),
            );
        }
    }

    /// Removes a mapping that a full build would make stale.
    fn discard_mapping(&self, session: &ScratchSession) {
        let path = session.mapping_path();
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "discarded mapping"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not discard mapping"),
        }
    }
}

fn finish(
    did_work: bool,
    mode: CompilationMode,
    compiler_diagnostics: Vec<Diagnostic>,
    sink: &DiagnosticSink,
) -> CompilationResult {
    let mut diagnostics = compiler_diagnostics;
    diagnostics.extend(sink.take_all());
    CompilationResult {
        did_work,
        mode,
        diagnostics,
    }
}
