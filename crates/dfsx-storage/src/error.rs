//! Error types for the Storage Node.

use dfsx_core::DfsStatus;
use thiserror::Error;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error variants for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested path's parent directory is not in the served-directories
    /// whitelist.
    #[error("path is not served by this node")]
    NotAcceptable,

    /// The file does not exist (GET/DELETE/HEAD of an absent file).
    #[error("no content")]
    NoContent,

    /// The lease check at the Lease Manager rejected this request.
    #[error("lease check rejected this request")]
    Unauthorized,

    /// Local filesystem I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The Lease Manager or Directory Registry could not be reached, or
    /// returned an unexpected status.
    #[error("transport error: {0}")]
    Transport(String),
}

impl StorageError {
    /// Maps this error onto the cross-service status vocabulary.
    pub fn status(&self) -> DfsStatus {
        match self {
            StorageError::NotAcceptable => DfsStatus::NotAcceptable,
            StorageError::NoContent => DfsStatus::NoContent,
            StorageError::Unauthorized => DfsStatus::Unauthorized,
            StorageError::Io(_) => DfsStatus::Transport,
            StorageError::Transport(_) => DfsStatus::Transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(StorageError::NotAcceptable.status(), DfsStatus::NotAcceptable);
        assert_eq!(StorageError::NoContent.status(), DfsStatus::NoContent);
        assert_eq!(StorageError::Unauthorized.status(), DfsStatus::Unauthorized);
    }
}
