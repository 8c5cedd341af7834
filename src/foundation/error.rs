use std::path::{Path, PathBuf};

/// Convenience result type used across picbook.
pub type BookResult<T> = Result<T, BookError>;

/// Top-level error taxonomy used by library APIs.
#[derive(thiserror::Error, Debug)]
pub enum BookError {
    /// Malformed identifiers, over-quota batches, blank text or URLs. Raised before any IO.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A manifest or base image is absent. The message names the expected file pattern.
    #[error("not found: {0}")]
    NotFound(String),

    /// Read, write, decode or rename failure on a specific path.
    #[error("io failure at '{}': {source}", path.display())]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A manifest exists but cannot be parsed or violates its invariants.
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BookError {
    /// Build a [`BookError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`BookError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`BookError::Io`] value for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a [`BookError::Io`] value from any error type (image codecs, PDF writer, ...).
    pub fn io_other<E>(path: impl AsRef<Path>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::io(path, std::io::Error::other(source))
    }

    /// Build a [`BookError::CorruptState`] value.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptState(msg.into())
    }

    /// Stable lowercase tag for structured outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Io { .. } => "io_failure",
            Self::CorruptState(_) => "corrupt_state",
            Self::Other(_) => "internal",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
