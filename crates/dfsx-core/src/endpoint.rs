//! Storage endpoint identifiers (`host:port` pairs).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `host:port` pair identifying a storage process.
///
/// Stored and compared as the raw string form rather than a resolved
/// `SocketAddr`: endpoints may name unresolvable-at-registration-time hosts
/// (containers, DNS names) and the registry never needs to connect to them
/// itself, only hand the string back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(String);

/// Error returned when a string is not a valid `host:port` endpoint.
#[derive(Debug, thiserror::Error)]
#[error("invalid endpoint {0:?}: expected host:port")]
pub struct InvalidEndpoint(pub String);

impl Endpoint {
    /// Parses and validates a `host:port` string.
    pub fn parse(s: &str) -> Result<Self, InvalidEndpoint> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| InvalidEndpoint(s.to_string()))?;
        if host.is_empty() || port.parse::<u16>().is_err() {
            return Err(InvalidEndpoint(s.to_string()));
        }
        Ok(Endpoint(s.to_string()))
    }

    /// Returns the endpoint as a plain `host:port` string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a base URL (`http://host:port`) suitable for building request URIs.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl FromStr for Endpoint {
    type Err = InvalidEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
