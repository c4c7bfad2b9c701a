//! Process configuration for the lease manager server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Lease manager process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Path to the sled database backing the lease map.
    pub dbfile: PathBuf,
    /// Lease lifetime in seconds.
    pub lock_lifetime: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9100)),
            dbfile: PathBuf::from("leases.db"),
            lock_lifetime: 60,
        }
    }
}

impl LeaseConfig {
    /// Loads configuration from `path`, overlaying [`Default`] values. See
    /// [`dfsx_registry::config::RegistryConfig::load`] for the missing-file
    /// semantics this mirrors.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Parses a config file, dispatching on its extension (`.json` or `.toml`).
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match ext.to_lowercase().as_str() {
            "toml" => Ok(toml::from_str(&contents)?),
            _ => Ok(serde_json::from_str(&contents)?),
        }
    }
}
