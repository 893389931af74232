//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors raised while loading or validating `anvil.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML content is malformed or has the wrong shape.
    #[error("invalid anvil.toml: {0}")]
    Parse(String),

    /// A required setting is absent or empty.
    #[error("missing required setting `{0}`")]
    MissingField(&'static str),

    /// A setting has a value outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted name of the setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
