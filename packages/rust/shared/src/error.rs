//! Error types for markovcg.
//!
//! Library crates use [`MarkovError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all markovcg operations.
#[derive(Debug, thiserror::Error)]
pub enum MarkovError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input to a training operation (bad order, malformed model, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Model (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A background training task could not be joined.
    #[error("task error: {0}")]
    Task(String),

    /// A single document could not be processed and the run was aborted.
    #[error("document {origin} failed: {message}")]
    Document { origin: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MarkovError>;

impl MarkovError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a document error for the given origin.
    pub fn document(origin: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Document {
            origin: origin.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for MarkovError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = MarkovError::config("order must be an integer");
        assert_eq!(err.to_string(), "config error: order must be an integer");

        let err = MarkovError::validation("order 0 is not supported");
        assert!(err.to_string().contains("order 0"));

        let err = MarkovError::document("s01e01.txt", "task panicked");
        assert_eq!(err.to_string(), "document s01e01.txt failed: task panicked");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = MarkovError::io(
            "/missing/file.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/missing/file.txt"));
    }
}
