//! Collects diagnostics raised during one build invocation.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe diagnostic collector.
///
/// Per-severity counts are kept outside the lock so `has_errors` never
/// contends with emitters.
#[derive(Default)]
pub struct DiagnosticSink {
    collected: Mutex<Vec<Diagnostic>>,
    counts: [AtomicUsize; 3],
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn collected(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // A panicking emitter cannot leave the vector half-written.
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.counts[diagnostic.severity.index()].fetch_add(1, Ordering::Relaxed);
        self.collected().push(diagnostic);
    }

    /// Records every diagnostic in `diagnostics`.
    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        diagnostics.into_iter().for_each(|d| self.emit(d));
    }

    /// Number of diagnostics emitted at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity.index()].load(Ordering::Relaxed)
    }

    /// Returns `true` once any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Drains the collected diagnostics in emission order.
    ///
    /// Counts are cumulative and are not reset.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.collected())
    }
}
