//! How serious a reported condition is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a [`Diagnostic`](crate::Diagnostic), least severe first.
///
/// Only [`Severity::Error`] fails a compilation. Fallbacks and persistence
/// problems inside the incremental core are reported as warnings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Extra context for another diagnostic.
    Note,
    /// Worth reading, does not fail the build.
    Warning,
    /// Fails the build.
    Error,
}

impl Severity {
    /// Every severity in ascending order.
    pub const ALL: [Severity; 3] = [Severity::Note, Severity::Warning, Severity::Error];

    /// Returns `true` for [`Severity::Error`].
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    /// The lowercase label used when rendering.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
