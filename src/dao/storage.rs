use std::error::Error;
use thiserror::Error;

use crate::paging::RemoteError;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by page stores regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// No store is installed (degraded mode).
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The requested backend was not compiled into this binary.
    #[error("storage backend `{backend}` is not enabled in this build")]
    Unsupported { backend: &'static str },
    /// A page cursor could not be interpreted by the store that received it.
    #[error("invalid page cursor: {reason}")]
    InvalidCursor { reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a cursor error with a short explanation.
    pub fn invalid_cursor(reason: impl Into<String>) -> Self {
        StorageError::InvalidCursor {
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for RemoteError {
    fn from(err: StorageError) -> Self {
        RemoteError::new(err.to_string())
    }
}
