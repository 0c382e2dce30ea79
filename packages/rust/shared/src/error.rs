//! Error types for Docmill.
//!
//! Library crates surface [`DocmillError`] via `thiserror`. Callers match on
//! the variant to tell configuration mistakes apart from runtime module
//! failures; nothing in the engine swallows an error silently.

use std::path::PathBuf;

/// Top-level error type for all Docmill operations.
#[derive(Debug, thiserror::Error)]
pub enum DocmillError {
    /// Null or invalid input passed to a pure operation (e.g. a null path).
    #[error("argument error: {message}")]
    Argument { message: String },

    /// Document clone invariant violated: the clone primitive produced no
    /// instance, or returned the source instance itself.
    #[error("construction error: {message}")]
    Construction { message: String },

    /// A metadata value exists but cannot be converted to the requested type.
    #[error("conversion error for key {key:?}: cannot convert {found} to {requested}")]
    Conversion {
        key: String,
        found: String,
        requested: &'static str,
    },

    /// Cyclic or unresolved pipeline wiring, detected before execution.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Failure raised while a module processed one document.
    #[error("module {module} failed on {document}: {message}")]
    Module {
        module: String,
        document: String,
        message: String,
    },

    /// Filesystem I/O error while materializing content.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The run was cancelled before completion.
    #[error("execution cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocmillError>;

impl DocmillError {
    /// Create an argument error from any displayable message.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument {
            message: msg.into(),
        }
    }

    /// Create a construction error from any displayable message.
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction {
            message: msg.into(),
        }
    }

    /// Create a configuration error from any displayable message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create a conversion error for a metadata key.
    pub fn conversion(
        key: impl Into<String>,
        found: impl Into<String>,
        requested: &'static str,
    ) -> Self {
        Self::Conversion {
            key: key.into(),
            found: found.into(),
            requested,
        }
    }

    /// Attribute a failure to one document processed by one module.
    pub fn module(
        module: impl Into<String>,
        document: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Module {
            module: module.into(),
            document: document.into(),
            message: message.into(),
        }
    }

    /// Wrap a `std::io::Error` with the offending path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
