//! Cross-service integration harness for dfsx.
//!
//! Spins up real registry, lease-manager and storage-node servers on
//! ephemeral loopback ports and exposes a [`harness::Cluster`] scenario tests
//! drive through [`dfsx_client::Session`], exercising the protocol the way an
//! application actually would rather than calling library internals.

/// Ephemeral-port cluster of the three servers, for scenario tests.
pub mod harness;
