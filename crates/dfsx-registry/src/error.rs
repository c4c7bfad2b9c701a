//! Error types for the Directory Registry.

use dfsx_core::DfsStatus;
use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error variants for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No directory mapping exists for the requested file.
    #[error("no file server serves this file")]
    NotFound,

    /// A required field (`srv`, or `dirs` on the root batch route) was absent.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The durable backing store reported a failure.
    #[error("store error: {0}")]
    Store(String),

    /// An endpoint string failed to parse as `host:port`.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] dfsx_core::endpoint::InvalidEndpoint),
}

impl RegistryError {
    /// Maps this error onto the cross-service status vocabulary.
    pub fn status(&self) -> DfsStatus {
        match self {
            RegistryError::NotFound => DfsStatus::NotFound,
            RegistryError::BadRequest(_) => DfsStatus::BadRequest,
            RegistryError::InvalidEndpoint(_) => DfsStatus::BadRequest,
            RegistryError::Store(_) => DfsStatus::Transport,
        }
    }
}
