//! Error types for the Client Session.

use dfsx_core::{DfsIoError, DfsStatus};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Error variants for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Directory Registry has no mapping for the requested path.
    #[error("no server serves this file")]
    NotFound,

    /// The file is currently locked by another session.
    #[error("the file is locked")]
    Locked,

    /// A storage or lease operation was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Local buffering I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A cross-service call failed at the transport level.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Maps this error onto the cross-service status vocabulary.
    pub fn status(&self) -> DfsStatus {
        match self {
            ClientError::NotFound => DfsStatus::NotFound,
            ClientError::Locked => DfsStatus::Conflict,
            ClientError::Unauthorized(_) => DfsStatus::Unauthorized,
            ClientError::Io(_) => DfsStatus::Transport,
            ClientError::Transport(_) => DfsStatus::Transport,
        }
    }
}

impl From<ClientError> for DfsIoError {
    fn from(err: ClientError) -> Self {
        let status = err.status();
        DfsIoError::new(status, err.to_string())
    }
}
