#![warn(missing_docs)]

//! Lease Manager: grants, validates and expires per-file write leases.
//! This is the one component in the coordination protocol that every
//! other role consults before mutating anything, so its state machine and
//! concurrency model are the hard part of this workspace.

/// HTTP surface (axum router, handlers).
pub mod api;
/// Process configuration, loaded from an optional JSON/TOML overlay file.
pub mod config;
/// Error kinds for the lease manager.
pub mod error;
/// Core lease state machine: check, grant, revoke, dump.
pub mod lease;
/// Durable backing store abstraction (sled-backed, with an in-memory test double).
pub mod store;

pub use error::LeaseError;
pub use lease::LeaseManager;
