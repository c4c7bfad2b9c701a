#![warn(missing_docs)]

//! Storage Node: serves file contents subject to lease checks delegated to
//! the Lease Manager. Trusts the Lease Manager's verdict; applies
//! no cryptographic validation of lease ids.

/// HTTP surface (axum router, handlers).
pub mod api;
/// Process configuration, loaded from an optional JSON/TOML overlay file.
pub mod config;
/// Error kinds for the storage node.
pub mod error;
/// Core read/write/delete operations and the served-directories whitelist.
pub mod node;

pub use error::StorageError;
pub use node::StorageNode;
