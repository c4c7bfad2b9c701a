//! Durable backing store for the directory -> endpoint map.
//!
//! The registry treats its persistent backing as an opaque durable map: this
//! module supplies a trait so the rest of the crate never depends on a
//! concrete backend, the same separation a metadata service draws between
//! itself and its storage engine.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use crate::error::{RegistryError, RegistryResult};

/// A durable (or, for tests, in-memory) `directory -> endpoint string` map.
///
/// Implementations need not be ordered internally, but [`RegistryStore::scan_all`]
/// must return entries sorted by key so [`crate::directory::DirectoryRegistry::list`]
/// can satisfy a deterministic-ordering listing without re-sorting on every call.
pub trait RegistryStore: Send + Sync {
    /// Fetches the endpoint registered for `dir`, if any.
    fn get(&self, dir: &str) -> RegistryResult<Option<String>>;

    /// Inserts or overwrites the mapping for `dir`.
    fn put(&self, dir: &str, endpoint: &str) -> RegistryResult<()>;

    /// Removes the mapping for `dir`. Not an error if absent.
    fn remove(&self, dir: &str) -> RegistryResult<()>;

    /// Returns all `(dir, endpoint)` pairs sorted by directory path.
    fn scan_all(&self) -> RegistryResult<Vec<(String, String)>>;
}

/// Sled-backed durable store. One tree (`registry`) holds the directory map;
/// `sled::Db`'s iteration is already key-sorted, so [`RegistryStore::scan_all`]
/// needs no extra sort step.
pub struct SledRegistryStore {
    tree: sled::Tree,
}

impl SledRegistryStore {
    /// Opens (or creates) a sled database at `path` and returns a store backed
    /// by its default tree.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let db = sled::open(path).map_err(|e| RegistryError::Store(e.to_string()))?;
        Ok(Self { tree: db.open_tree("registry").map_err(|e| RegistryError::Store(e.to_string()))? })
    }
}

impl RegistryStore for SledRegistryStore {
    fn get(&self, dir: &str) -> RegistryResult<Option<String>> {
        self.tree
            .get(dir.as_bytes())
            .map_err(|e| RegistryError::Store(e.to_string()))?
            .map(|v| {
                String::from_utf8(v.to_vec()).map_err(|e| RegistryError::Store(e.to_string()))
            })
            .transpose()
    }

    fn put(&self, dir: &str, endpoint: &str) -> RegistryResult<()> {
        self.tree
            .insert(dir.as_bytes(), endpoint.as_bytes())
            .map_err(|e| RegistryError::Store(e.to_string()))?;
        self.tree.flush().map_err(|e| RegistryError::Store(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, dir: &str) -> RegistryResult<()> {
        self.tree
            .remove(dir.as_bytes())
            .map_err(|e| RegistryError::Store(e.to_string()))?;
        self.tree.flush().map_err(|e| RegistryError::Store(e.to_string()))?;
        Ok(())
    }

    fn scan_all(&self) -> RegistryResult<Vec<(String, String)>> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (k, v) = item.map_err(|e| RegistryError::Store(e.to_string()))?;
            let dir = String::from_utf8(k.to_vec()).map_err(|e| RegistryError::Store(e.to_string()))?;
            let endpoint = String::from_utf8(v.to_vec()).map_err(|e| RegistryError::Store(e.to_string()))?;
            out.push((dir, endpoint));
        }
        Ok(out)
    }
}

/// In-memory store for tests, backed by a `BTreeMap` so iteration order
/// matches the sled backend without any extra sorting.
#[derive(Default)]
pub struct MemoryRegistryStore {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemoryRegistryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn get(&self, dir: &str) -> RegistryResult<Option<String>> {
        Ok(self.data.read().unwrap().get(dir).cloned())
    }

    fn put(&self, dir: &str, endpoint: &str) -> RegistryResult<()> {
        self.data
            .write()
            .unwrap()
            .insert(dir.to_string(), endpoint.to_string());
        Ok(())
    }

    fn remove(&self, dir: &str) -> RegistryResult<()> {
        self.data.write().unwrap().remove(dir);
        Ok(())
    }

    fn scan_all(&self) -> RegistryResult<Vec<(String, String)>> {
        Ok(self
            .data
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
