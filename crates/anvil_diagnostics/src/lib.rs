//! Diagnostics reported by the compiler and by the incremental build core.
//!
//! [`Diagnostic`] carries a severity, a message and an optional source
//! location. The thread-safe [`DiagnosticSink`] accumulates diagnostics during
//! one build invocation so they can be handed back to the caller.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use diagnostic::{Diagnostic, Location};
pub use severity::Severity;
pub use sink::DiagnosticSink;
