//! Process configuration for client sessions.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Client session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Directory Registry.
    pub nameserver: String,
    /// Base URL of the Lease Manager.
    pub lockserver: String,
    /// Spillover threshold in bytes: buffers larger than this move to a
    /// temporary file.
    pub max_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nameserver: "http://127.0.0.1:9000".to_string(),
            lockserver: "http://127.0.0.1:9100".to_string(),
            max_size: 1024 * 1024,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `path`, overlaying [`Default`] values.
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

    #[test]
    fn default_max_size_is_one_megabyte() {
        assert_eq!(ClientConfig::default().max_size, 1024 * 1024);
    }

    #[test]
    fn missing_path_returns_defaults() {
        let config = ClientConfig::load(None).unwrap();
        assert_eq!(config.max_size, ClientConfig::default().max_size);
    }
}
