//! Compiler wrapper that removes stale outputs before compiling.

use anvil_diagnostics::Diagnostic;

use crate::compiler::{CompileOptions, CompileRequest, Compiler};
use crate::deleter::Deleter;
use crate::error::CompileError;
use crate::mapping::ClassNameMapping;
use crate::recompile::RecompilationSpec;
use crate::source::SourceUnit;

/// Result of one cleaning compilation.
#[derive(Debug, Clone, Default)]
pub struct WorkResult {
    /// Whether anything was deleted or compiled.
    pub did_work: bool,
    /// Associations reported by the compiler for this invocation.
    pub associations: ClassNameMapping,
    /// Non-fatal compiler diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Wraps a [`Compiler`]: deletes stale outputs, then compiles.
///
/// A deletion failure aborts before the compiler runs, so a recompiled unit
/// never lands next to stale siblings.
pub struct CleaningCompiler<'a, C: ?Sized, D: ?Sized> {
    unit: &'a str,
    compiler: &'a C,
    deleter: &'a D,
    options: &'a CompileOptions,
}

impl<'a, C, D> CleaningCompiler<'a, C, D>
where
    C: Compiler + ?Sized,
    D: Deleter + ?Sized,
{
    /// Creates a cleaning compiler for the unit of work named `unit`.
    pub fn new(unit: &'a str, compiler: &'a C, deleter: &'a D, options: &'a CompileOptions) -> Self {
        Self {
            unit,
            compiler,
            deleter,
            options,
        }
    }

    /// Deletes `spec.artifacts_to_delete`, then compiles `spec.sources_to_recompile`.
    ///
    /// The compiler is skipped when there is nothing to recompile.
    pub fn execute(&self, spec: &RecompilationSpec) -> Result<WorkResult, CompileError> {
        let locations: Vec<_> = spec
            .artifacts_to_delete
            .iter()
            .map(|a| a.location.clone())
            .collect();
        let deleted = self.deleter.delete(&locations).map_err(|source| CompileError::Delete {
            unit: self.unit.to_string(),
            source,
        })?;
        let sources: Vec<SourceUnit> = spec.sources_to_recompile.iter().cloned().collect();
        let mut result = self.invoke(&sources)?;
        result.did_work |= deleted > 0;
        Ok(result)
    }

    /// Purges the destination directory, then compiles every source.
    pub fn execute_full(&self, sources: &[SourceUnit]) -> Result<WorkResult, CompileError> {
        let cleaned = self
            .deleter
            .clean_directory(&self.options.destination)
            .map_err(|source| CompileError::Delete {
                unit: self.unit.to_string(),
                source,
            })?;
        let mut result = self.invoke(sources)?;
        result.did_work |= cleaned;
        Ok(result)
    }

    fn invoke(&self, sources: &[SourceUnit]) -> Result<WorkResult, CompileError> {
        if sources.is_empty() {
            return Ok(WorkResult::default());
        }
        tracing::debug!(unit = self.unit, sources = sources.len(), "invoking compiler");
        let outcome = self.compiler.compile(CompileRequest {
            sources,
            options: self.options,
        });
        let error_count = outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count();
        if !outcome.success || error_count > 0 {
            return Err(CompileError::Compile {
                unit: self.unit.to_string(),
                error_count,
                diagnostics: outcome.diagnostics,
            });
        }
        Ok(WorkResult {
            did_work: true,
            associations: outcome.associations,
            diagnostics: outcome.diagnostics,
        })
    }
}
