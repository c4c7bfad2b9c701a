//! Error types for the Lease Manager.

use dfsx_core::DfsStatus;
use thiserror::Error;

/// Result type alias for lease operations.
pub type LeaseResult<T> = Result<T, LeaseError>;

/// Error variants for lease operations.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// A lease exists and the caller is not its owner (`check` mismatch/expired-absent case).
    #[error("file is locked")]
    Conflict,

    /// A lease could not be granted because a valid lease already exists.
    #[error("unable to grant lease")]
    Unauthorized,

    /// A malformed batch-revoke request (mismatched array lengths).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The durable backing store reported a failure.
    #[error("store error: {0}")]
    Store(String),
}

impl LeaseError {
    /// Maps this error onto the cross-service status vocabulary.
    pub fn status(&self) -> DfsStatus {
        match self {
            LeaseError::Conflict => DfsStatus::Conflict,
            LeaseError::Unauthorized => DfsStatus::Unauthorized,
            LeaseError::BadRequest(_) => DfsStatus::BadRequest,
            LeaseError::Store(_) => DfsStatus::Transport,
        }
    }
}
