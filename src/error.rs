//! Error types.
//!
//! Resolution itself never fails: bad input degrades to defaults. These errors
//! only surface while building a schema, loading configuration, or writing to a
//! persistent store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the edges of the engine.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// Two fields in one blueprint set share a key.
    #[error("duplicate field key: {0}")]
    DuplicateKey(String),

    /// A field was registered without a key.
    #[error("field key must not be empty")]
    EmptyKey,

    /// A key list (hidden, enforced, ignored) names a field the set does not declare.
    #[error("unknown field key: {0}")]
    UnknownKey(String),

    /// A schema file could not be parsed.
    #[error("invalid schema {}: {message}", path.display())]
    Config {
        /// File the schema was read from (or `<inline>`).
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Filesystem failure while reading a schema or store.
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A persistent store refused a write.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ParamsError {
    /// Stable error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateKey(_) => "DUPLICATE_KEY",
            Self::EmptyKey => "EMPTY_KEY",
            Self::UnknownKey(_) => "UNKNOWN_KEY",
            Self::Config { .. } => "INVALID_CONFIG",
            Self::Io { .. } => "IO",
            Self::Storage(_) => "STORAGE",
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
