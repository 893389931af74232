//! Interface to the underlying source-to-artifact compiler.

use std::path::PathBuf;

use anvil_diagnostics::Diagnostic;

use crate::mapping::ClassNameMapping;
use crate::source::SourceUnit;

/// Options passed through to the underlying compiler unchanged.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Directory receiving compiled artifacts.
    pub destination: PathBuf,
    /// Compile classpath.
    pub classpath: Vec<PathBuf>,
    /// Extra compiler arguments.
    pub arguments: Vec<String>,
}

/// One invocation of the underlying compiler.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Exactly the sources to compile.
    pub sources: &'a [SourceUnit],
    /// Compiler options.
    pub options: &'a CompileOptions,
}

/// What the underlying compiler reports back.
#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    /// Whether compilation succeeded.
    pub success: bool,
    /// Artifacts produced by each compiled source in this invocation.
    pub associations: ClassNameMapping,
    /// Errors and warnings reported by the compiler.
    pub diagnostics: Vec<Diagnostic>,
}

/// The underlying compiler.
pub trait Compiler {
    /// Compiles exactly `request.sources` into `request.options.destination`.
    fn compile(&self, request: CompileRequest<'_>) -> CompileOutcome;

    /// Whether [`CompileOutcome::associations`] is populated.
    ///
    /// Command-line style compilers cannot say which artifacts came from which
    /// source; the engine then derives names by convention and keeps no
    /// mapping history.
    fn reports_associations(&self) -> bool {
        true
    }
}

impl<C: Compiler + ?Sized> Compiler for &C {
    fn compile(&self, request: CompileRequest<'_>) -> CompileOutcome {
        (**self).compile(request)
    }

    fn reports_associations(&self) -> bool {
        (**self).reports_associations()
    }
}
