//! Process configuration for the storage node server.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Storage node process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Base URL of the Lease Manager.
    pub lockserver: String,
    /// Base URL of the Directory Registry.
    pub nameserver: String,
    /// Served-directories whitelist, loaded at startup and immutable during run.
    pub directories: BTreeSet<String>,
    /// Local filesystem root files are joined against.
    pub fsroot: PathBuf,
    /// This node's own advertised `host:port`, announced to the registry at startup.
    pub srv: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9400)),
            lockserver: "http://127.0.0.1:9100".to_string(),
            nameserver: "http://127.0.0.1:9000".to_string(),
            directories: BTreeSet::new(),
            fsroot: PathBuf::from("./fsroot"),
            srv: "127.0.0.1:9400".to_string(),
        }
    }
}

impl StorageConfig {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_has_empty_directories() {
        assert!(StorageConfig::default().directories.is_empty());
    }

    #[test]
    fn partial_json_overlays_defaults() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{ "directories": ["/d", "/e"], "srv": "s1:9400" }}"#).unwrap();
        let config = StorageConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.directories.len(), 2);
        assert_eq!(config.srv, "s1:9400");
        assert_eq!(config.fsroot, StorageConfig::default().fsroot);
    }
}
