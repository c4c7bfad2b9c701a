//! Process configuration for the registry server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Registry process configuration. Loaded from an optional JSON (or TOML)
/// overlay file; unset fields keep their [`Default`] value and unknown keys
/// are silently ignored (`serde`'s default behavior).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Path to the sled database backing the directory map.
    pub dbfile: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            dbfile: PathBuf::from("registry.db"),
        }
    }
}

impl RegistryConfig {
    /// Loads configuration from `path`, overlaying [`Default`] values.
    ///
    /// If `path` is `None` or the file does not exist, returns defaults
    /// untouched, matching the original `utils.load_config`'s "if the file
    /// doesn't exist, do nothing" behavior.
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
    fn default_values() {
        let config = RegistryConfig::default();
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.dbfile, PathBuf::from("registry.db"));
    }

    #[test]
    fn missing_path_returns_defaults() {
        let config = RegistryConfig::load(None).unwrap();
        assert_eq!(config.bind_addr, RegistryConfig::default().bind_addr);
    }

    #[test]
    fn absent_file_returns_defaults() {
        let config = RegistryConfig::load(Some(Path::new("/nonexistent/registry.json"))).unwrap();
        assert_eq!(config.dbfile, RegistryConfig::default().dbfile);
    }

    #[test]
    fn partial_json_overlays_defaults() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{ "dbfile": "/custom/registry.db" }}"#).unwrap();

        let config = RegistryConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.dbfile, PathBuf::from("/custom/registry.db"));
        assert_eq!(config.bind_addr, RegistryConfig::default().bind_addr);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{ "dbfile": "/x/r.db", "made_up_field": 42 }}"#).unwrap();
        let config = RegistryConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.dbfile, PathBuf::from("/x/r.db"));
    }
}
