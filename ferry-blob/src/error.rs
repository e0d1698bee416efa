use thiserror::Error;

use crate::FailedKey;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by datasource backends.
///
/// A missing object is never an error; backends report absence as `None`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Invalid datasource configuration: {message}")]
    Config { message: String },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to remove {} object(s)", .failed.len())]
    PartialClear { failed: Vec<FailedKey> },

    /// Listing broke off mid-clear; `failed` holds the deletes refused before that.
    #[error("Listing failed during clear ({} object(s) not removed): {source}", .failed.len())]
    InterruptedClear {
        #[source]
        source: Box<StorageError>,
        failed: Vec<FailedKey>,
    },
}

impl StorageError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Keys that could not be removed, if this is a partial clear.
    pub fn failed_keys(&self) -> &[FailedKey] {
        match self {
            Self::PartialClear { failed } | Self::InterruptedClear { failed, .. } => failed,
            _ => &[],
        }
    }

    /// Outcome of a clear sweep: the listing error, if any, wins but keeps `failed`.
    pub(crate) fn from_clear(listing: Option<StorageError>, failed: Vec<FailedKey>) -> StorageResult<()> {
        match listing {
            Some(err) => Err(Self::InterruptedClear {
                source: Box::new(err),
                failed,
            }),
            None if failed.is_empty() => Ok(()),
            None => Err(Self::PartialClear { failed }),
        }
    }
}
