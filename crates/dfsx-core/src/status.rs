//! Cross-service error kinds and their HTTP status mapping.

use std::fmt;

/// The error categories surfaced across the coordination protocol.
///
/// Every service maps its own `thiserror` error enum onto one of these
/// variants at the HTTP boundary; clients reconstruct the same variant from
/// the response status code, so the mapping in [`DfsStatus::http_code`] and
/// [`DfsStatus::from_http_code`] must stay inverses of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfsStatus {
    /// No directory mapping, or file absent on GET/DELETE/HEAD.
    NotFound,
    /// A lease exists and the caller is not its owner.
    Conflict,
    /// A storage operation was rejected by the lease check, or a grant was refused.
    Unauthorized,
    /// The storage node does not serve this path.
    NotAcceptable,
    /// A malformed registry or batch-revoke request.
    BadRequest,
    /// File absent but the request mode may legitimately continue (append-open reads).
    NoContent,
    /// A network-level failure; not retried by the core.
    Transport,
    /// Request succeeded.
    Ok,
}

impl DfsStatus {
    /// Maps a status to the HTTP status code used on the wire.
    pub fn http_code(self) -> u16 {
        match self {
            DfsStatus::Ok => 200,
            DfsStatus::NoContent => 204,
            DfsStatus::BadRequest => 400,
            DfsStatus::Unauthorized => 401,
            DfsStatus::NotFound => 404,
            DfsStatus::NotAcceptable => 406,
            DfsStatus::Conflict => 409,
            DfsStatus::Transport => 599,
        }
    }

    /// Reconstructs a status from an observed HTTP status code.
    ///
    /// Unrecognized codes (e.g. a transport-level failure before any status
    /// line was read) map to [`DfsStatus::Transport`].
    pub fn from_http_code(code: u16) -> Self {
        match code {
            200 => DfsStatus::Ok,
            204 => DfsStatus::NoContent,
            400 => DfsStatus::BadRequest,
            401 => DfsStatus::Unauthorized,
            404 => DfsStatus::NotFound,
            406 => DfsStatus::NotAcceptable,
            409 => DfsStatus::Conflict,
            _ => DfsStatus::Transport,
        }
    }
}

impl fmt::Display for DfsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DfsStatus::Ok => "ok",
            DfsStatus::NotFound => "not found",
            DfsStatus::Conflict => "conflict",
            DfsStatus::Unauthorized => "unauthorized",
            DfsStatus::NotAcceptable => "not acceptable",
            DfsStatus::BadRequest => "bad request",
            DfsStatus::NoContent => "no content",
            DfsStatus::Transport => "transport error",
        };
        write!(f, "{s}")
    }
}

/// The single error kind application code sees across every dfsx client
/// operation, carrying the
/// underlying status and a human-readable message.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct DfsIoError {
    /// The status category this error belongs to.
    pub status: DfsStatus,
    /// A human-readable description, safe to log or display.
    pub message: String,
}

impl DfsIoError {
    /// Builds a new error from a status and message.
    pub fn new(status: DfsStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_code_roundtrips() {
        for status in [
            DfsStatus::Ok,
            DfsStatus::NoContent,
            DfsStatus::BadRequest,
            DfsStatus::Unauthorized,
            DfsStatus::NotFound,
            DfsStatus::NotAcceptable,
            DfsStatus::Conflict,
        ] {
            assert_eq!(DfsStatus::from_http_code(status.http_code()), status);
        }
    }

    #[test]
    fn unknown_code_is_transport() {
        assert_eq!(DfsStatus::from_http_code(503), DfsStatus::Transport);
    }
}
