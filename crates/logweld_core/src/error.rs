//! Error types for commit-log combining.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for combine operations.
pub type CombineResult<T> = Result<T, CombineError>;

/// Errors that can occur while combining commit logs.
///
/// Every variant is fatal for the run that produced it. Nothing is rolled
/// back automatically: if the sentinel file is still present after an error,
/// the log directory needs manual recovery from the backup directory.
#[derive(Debug, Error)]
pub enum CombineError {
    /// The path does not exist.
    #[error("path does not exist: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The path exists but is not a directory.
    #[error("path must be a folder: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The directory name does not follow the commit-log naming convention.
    #[error("path must end with '{expected}': {}", path.display())]
    NamingMismatch {
        /// The offending path.
        path: PathBuf,
        /// The directory name that was expected.
        expected: String,
    },

    /// A previous run left segments behind in the working directory.
    #[error("working directory is not empty, a previous run may have aborted: {}", path.display())]
    WorkingDirNotEmpty {
        /// The working directory.
        path: PathBuf,
    },

    /// Filesystem error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being read, written or removed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Error reported by the compactor.
    #[error("compactor failed to {operation}: {message}")]
    Engine {
        /// The primitive that failed (e.g. "combine logs").
        operation: &'static str,
        /// Error message.
        message: String,
    },
}

impl CombineError {
    /// Creates an I/O error bound to a path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a compactor error.
    pub fn engine(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Engine {
            operation,
            message: message.into(),
        }
    }

    /// Returns true if the error means the target path is unusable.
    pub fn is_path_invalid(&self) -> bool {
        matches!(
            self,
            CombineError::NotFound { .. }
                | CombineError::NotADirectory { .. }
                | CombineError::NamingMismatch { .. }
        )
    }

    /// Returns true if the error came from the compactor.
    pub fn is_engine(&self) -> bool {
        matches!(self, CombineError::Engine { .. })
    }
}

/// Extension for attaching a path to `io::Result` values.
pub(crate) trait IoResultExt<T> {
    /// Converts the error into [`CombineError::Io`] for `path`.
    fn at(self, path: &Path) -> CombineResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> CombineResult<T> {
        self.map_err(|e| CombineError::io(path, e))
    }
}
